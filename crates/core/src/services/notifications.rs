//! Staff-authored notifications.
//!
//! A notification either targets one AppUser or, with no target, is a
//! broadcast. Broadcasts are visible to an AppUser only while one of their
//! granted patients has an active admission, so discharged families stop
//! receiving ward-wide notices.

use crate::entities::Notification;
use crate::services::access::{self, PatientScope};
use crate::services::admissions;
use crate::{CoreError, CoreResult, Identity};
use chrono::Utc;
use serde::Deserialize;
use sqlx::SqlitePool;
use tracing::info;

#[derive(Debug, Clone, Deserialize, utoipa::ToSchema)]
pub struct NewNotification {
    /// None broadcasts to all currently admitted families
    pub target_user_id: Option<i64>,
    pub title: String,
    pub message: String,
    /// Defaults to in_app
    pub channels: Option<String>,
}

pub async fn create(
    pool: &SqlitePool,
    identity: &Identity,
    new: &NewNotification,
) -> CoreResult<Notification> {
    access::require_staff(identity)?;
    let author = access::require_account(identity)?;
    if new.title.trim().is_empty() || new.message.trim().is_empty() {
        return Err(CoreError::InvalidInput("title and message are required.".into()));
    }
    if let Some(target) = new.target_user_id {
        let exists: Option<i64> =
            sqlx::query_scalar("SELECT id FROM app_user WHERE id = ?1 AND is_active = 1")
                .bind(target)
                .fetch_optional(pool)
                .await?;
        if exists.is_none() {
            return Err(CoreError::NotFound("Target user not found.".into()));
        }
    }

    let id = sqlx::query(
        "INSERT INTO notification (created_by, target_user_id, title, message, channels, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
    )
    .bind(author.id)
    .bind(new.target_user_id)
    .bind(new.title.trim())
    .bind(new.message.trim())
    .bind(new.channels.as_deref().unwrap_or("in_app"))
    .bind(Utc::now())
    .execute(pool)
    .await?
    .last_insert_rowid();

    info!(notification_id = id, broadcast = new.target_user_id.is_none(), "notification sent");
    fetch(pool, id).await
}

/// Lists notifications visible to the caller, newest first.
pub async fn list(pool: &SqlitePool, identity: &Identity) -> CoreResult<Vec<Notification>> {
    match identity {
        Identity::Staff(_) => {
            let rows = sqlx::query_as::<_, Notification>(
                "SELECT * FROM notification ORDER BY id DESC",
            )
            .fetch_all(pool)
            .await?;
            Ok(rows)
        }
        Identity::Anonymous => Ok(Vec::new()),
        Identity::AppUser(user) => {
            if broadcasts_visible(pool, identity).await? {
                let rows = sqlx::query_as::<_, Notification>(
                    "SELECT * FROM notification
                     WHERE target_user_id = ?1 OR target_user_id IS NULL
                     ORDER BY id DESC",
                )
                .bind(user.id)
                .fetch_all(pool)
                .await?;
                Ok(rows)
            } else {
                let rows = sqlx::query_as::<_, Notification>(
                    "SELECT * FROM notification WHERE target_user_id = ?1 ORDER BY id DESC",
                )
                .bind(user.id)
                .fetch_all(pool)
                .await?;
                Ok(rows)
            }
        }
    }
}

/// Marks a notification read. Only the targeted user may do so, and marking
/// twice keeps the first timestamp.
pub async fn mark_read(pool: &SqlitePool, identity: &Identity, id: i64) -> CoreResult<Notification> {
    let user = access::require_account(identity)?;
    let notification = fetch(pool, id).await?;
    match notification.target_user_id {
        Some(target) if target == user.id => {}
        Some(_) => return Err(CoreError::NotFound("Notification not found.".into())),
        // Broadcasts carry no per-user read state.
        None => {
            return Err(CoreError::InvalidInput(
                "Broadcast notifications cannot be marked read.".into(),
            ))
        }
    }

    sqlx::query("UPDATE notification SET read_at = ?1 WHERE id = ?2 AND read_at IS NULL")
        .bind(Utc::now())
        .bind(id)
        .execute(pool)
        .await?;
    fetch(pool, id).await
}

/// True while any of the caller's granted patients is actively admitted.
async fn broadcasts_visible(pool: &SqlitePool, identity: &Identity) -> CoreResult<bool> {
    let scope = access::visible_patients(pool, identity).await?;
    let ids = match scope {
        PatientScope::All => return Ok(true),
        PatientScope::Ids(ids) if ids.is_empty() => return Ok(false),
        PatientScope::Ids(ids) => ids,
    };
    for patient_id in ids {
        if admissions::active_admission(pool, patient_id).await?.is_some() {
            return Ok(true);
        }
    }
    Ok(false)
}

async fn fetch(pool: &SqlitePool, id: i64) -> CoreResult<Notification> {
    let notification = sqlx::query_as::<_, Notification>("SELECT * FROM notification WHERE id = ?1")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| CoreError::NotFound("Notification not found.".into()))?;
    Ok(notification)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::{seed_admission, seed_grant, seed_patient, seed_user, test_pool};
    use crate::entities::AppUser;

    async fn identity(pool: &SqlitePool, id: i64) -> Identity {
        let user: AppUser = sqlx::query_as("SELECT * FROM app_user WHERE id = ?1")
            .bind(id)
            .fetch_one(pool)
            .await
            .unwrap();
        if user.is_staff() {
            Identity::Staff(user)
        } else {
            Identity::AppUser(user)
        }
    }

    fn broadcast(title: &str) -> NewNotification {
        NewNotification {
            target_user_id: None,
            title: title.into(),
            message: "Visiting hours change tomorrow".into(),
            channels: None,
        }
    }

    #[tokio::test]
    async fn broadcasts_require_an_active_admission_to_be_seen() {
        let pool = test_pool().await;
        let staff = identity(&pool, seed_user(&pool, "s@h.test", "staff").await).await;
        let guardian_id = seed_user(&pool, "g@h.test", "guardian").await;
        let p1 = seed_patient(&pool, "MRN-1", "One").await;
        seed_grant(&pool, guardian_id, p1).await;
        let guardian = identity(&pool, guardian_id).await;

        create(&pool, &staff, &broadcast("Ward notice")).await.unwrap();

        // No active admission yet: the broadcast stays invisible.
        assert!(list(&pool, &guardian).await.unwrap().is_empty());

        seed_admission(&pool, p1, "active").await;
        let visible = list(&pool, &guardian).await.unwrap();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].title, "Ward notice");

        assert!(list(&pool, &Identity::Anonymous).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn targeted_notifications_reach_only_their_target() {
        let pool = test_pool().await;
        let staff = identity(&pool, seed_user(&pool, "s@h.test", "staff").await).await;
        let a_id = seed_user(&pool, "a@h.test", "guardian").await;
        let b_id = seed_user(&pool, "b@h.test", "guardian").await;
        let a = identity(&pool, a_id).await;
        let b = identity(&pool, b_id).await;

        create(
            &pool,
            &staff,
            &NewNotification {
                target_user_id: Some(a_id),
                title: "Discharge papers ready".into(),
                message: "Collect at reception".into(),
                channels: Some("in_app,sms".into()),
            },
        )
        .await
        .unwrap();

        assert_eq!(list(&pool, &a).await.unwrap().len(), 1);
        assert!(list(&pool, &b).await.unwrap().is_empty());
        assert_eq!(list(&pool, &staff).await.unwrap().len(), 1);

        let missing_target = create(
            &pool,
            &staff,
            &NewNotification {
                target_user_id: Some(9999),
                title: "x".into(),
                message: "y".into(),
                channels: None,
            },
        )
        .await;
        assert!(matches!(missing_target, Err(CoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn mark_read_is_target_guarded_and_idempotent() {
        let pool = test_pool().await;
        let staff = identity(&pool, seed_user(&pool, "s@h.test", "staff").await).await;
        let a_id = seed_user(&pool, "a@h.test", "guardian").await;
        let b = identity(&pool, seed_user(&pool, "b@h.test", "guardian").await).await;
        let a = identity(&pool, a_id).await;

        let note = create(
            &pool,
            &staff,
            &NewNotification {
                target_user_id: Some(a_id),
                title: "t".into(),
                message: "m".into(),
                channels: None,
            },
        )
        .await
        .unwrap();

        assert!(matches!(
            mark_read(&pool, &b, note.id).await,
            Err(CoreError::NotFound(_))
        ));

        let read = mark_read(&pool, &a, note.id).await.unwrap();
        let first = read.read_at.unwrap();
        let again = mark_read(&pool, &a, note.id).await.unwrap();
        assert_eq!(again.read_at.unwrap(), first);

        let bcast = create(&pool, &staff, &broadcast("Ward notice")).await.unwrap();
        assert!(matches!(
            mark_read(&pool, &a, bcast.id).await,
            Err(CoreError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn only_staff_create_notifications() {
        let pool = test_pool().await;
        let guardian = identity(&pool, seed_user(&pool, "g@h.test", "guardian").await).await;
        assert!(matches!(
            create(&pool, &guardian, &broadcast("nope")).await,
            Err(CoreError::Forbidden(_))
        ));
    }
}
