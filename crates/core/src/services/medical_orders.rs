//! Medical orders raised against an admission (labs, imaging, pharmacy).

use crate::entities::MedicalOrder;
use crate::services::{access, Bind};
use crate::{CoreError, CoreResult, Identity};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use sqlx::SqlitePool;
use tracing::info;
use utoipa::IntoParams;

#[derive(Debug, Default, Clone, Deserialize, IntoParams)]
#[serde(deny_unknown_fields)]
pub struct MedicalOrderFilter {
    pub admission_id: Option<i64>,
    pub order_type: Option<String>,
    pub status: Option<String>,
    /// Created at or after this instant
    pub created_from: Option<DateTime<Utc>>,
    /// Created strictly before this instant
    pub created_to: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize, utoipa::ToSchema)]
pub struct NewMedicalOrder {
    pub admission_id: i64,
    pub order_type: String,
    /// Free-form structured payload stored verbatim
    pub payload: Option<serde_json::Value>,
}

/// Places an order against an admission. Staff only; new orders start as
/// `ordered`.
pub async fn create(
    pool: &SqlitePool,
    identity: &Identity,
    new: &NewMedicalOrder,
) -> CoreResult<MedicalOrder> {
    access::require_staff(identity)?;
    let author = access::require_account(identity)?;
    let order_type = new.order_type.trim().to_lowercase();
    if order_type.is_empty() {
        return Err(CoreError::InvalidInput("order_type is required.".into()));
    }
    let admission: Option<i64> = sqlx::query_scalar("SELECT id FROM admission WHERE id = ?1")
        .bind(new.admission_id)
        .fetch_optional(pool)
        .await?;
    if admission.is_none() {
        return Err(CoreError::NotFound("Admission not found.".into()));
    }
    let payload_json = new
        .payload
        .as_ref()
        .map(|value| serde_json::to_string(value))
        .transpose()
        .map_err(|err| CoreError::InvalidInput(format!("invalid payload: {err}")))?;

    let id = sqlx::query(
        "INSERT INTO medical_order (admission_id, created_by, order_type, status, created_at, payload_json)
         VALUES (?1, ?2, ?3, 'ordered', ?4, ?5)",
    )
    .bind(new.admission_id)
    .bind(author.id)
    .bind(&order_type)
    .bind(Utc::now())
    .bind(payload_json)
    .execute(pool)
    .await?
    .last_insert_rowid();

    info!(medical_order_id = id, order_type, "medical order placed");
    fetch(pool, id).await
}

/// Staff-only listing with typed filters, newest first.
pub async fn list(
    pool: &SqlitePool,
    identity: &Identity,
    filter: &MedicalOrderFilter,
) -> CoreResult<Vec<MedicalOrder>> {
    access::require_staff(identity)?;

    let mut sql = String::from("SELECT * FROM medical_order WHERE 1 = 1");
    let mut binds: Vec<Bind> = Vec::new();

    if let Some(admission_id) = filter.admission_id {
        binds.push(Bind::Int(admission_id));
        sql.push_str(&format!(" AND admission_id = ?{}", binds.len()));
    }
    if let Some(kind) = filter.order_type.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
        binds.push(Bind::Text(kind.to_lowercase()));
        sql.push_str(&format!(" AND LOWER(order_type) = ?{}", binds.len()));
    }
    if let Some(status) = filter.status.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        binds.push(Bind::Text(status.to_lowercase()));
        sql.push_str(&format!(" AND LOWER(status) = ?{}", binds.len()));
    }
    if let Some(from) = filter.created_from {
        binds.push(Bind::At(from));
        sql.push_str(&format!(" AND created_at >= ?{}", binds.len()));
    }
    if let Some(to) = filter.created_to {
        binds.push(Bind::At(to));
        sql.push_str(&format!(" AND created_at < ?{}", binds.len()));
    }
    sql.push_str(" ORDER BY id DESC");

    let mut query = sqlx::query_as::<_, MedicalOrder>(&sql);
    for bind in binds {
        query = match bind {
            Bind::Text(text) => query.bind(text),
            Bind::Int(int) => query.bind(int),
            Bind::At(at) => query.bind(at),
        };
    }
    Ok(query.fetch_all(pool).await?)
}

pub async fn update_status(
    pool: &SqlitePool,
    identity: &Identity,
    id: i64,
    status: &str,
) -> CoreResult<MedicalOrder> {
    access::require_staff(identity)?;
    let status = status.trim().to_lowercase();
    if status.is_empty() {
        return Err(CoreError::InvalidInput("Status is required.".into()));
    }
    let affected = sqlx::query("UPDATE medical_order SET status = ?1 WHERE id = ?2")
        .bind(&status)
        .bind(id)
        .execute(pool)
        .await?
        .rows_affected();
    if affected == 0 {
        return Err(CoreError::NotFound("Medical order not found.".into()));
    }
    fetch(pool, id).await
}

async fn fetch(pool: &SqlitePool, id: i64) -> CoreResult<MedicalOrder> {
    let order = sqlx::query_as::<_, MedicalOrder>("SELECT * FROM medical_order WHERE id = ?1")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| CoreError::NotFound("Medical order not found.".into()))?;
    Ok(order)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::{seed_admission, seed_patient, seed_user, test_pool};
    use crate::entities::AppUser;
    use serde_json::json;

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

    #[tokio::test]
    async fn order_life_cycle_and_filters() {
        let pool = test_pool().await;
        let staff = identity(&pool, seed_user(&pool, "s@h.test", "staff").await).await;
        let p1 = seed_patient(&pool, "MRN-1", "One").await;
        let admission_id = seed_admission(&pool, p1, "active").await;

        let order = create(
            &pool,
            &staff,
            &NewMedicalOrder {
                admission_id,
                order_type: "Lab".into(),
                payload: Some(json!({"panel": "CBC"})),
            },
        )
        .await
        .unwrap();
        assert_eq!(order.status, "ordered");
        assert_eq!(order.order_type, "lab");
        assert!(order.payload_json.as_deref().unwrap_or("").contains("CBC"));

        create(
            &pool,
            &staff,
            &NewMedicalOrder {
                admission_id,
                order_type: "imaging".into(),
                payload: None,
            },
        )
        .await
        .unwrap();

        let labs = list(
            &pool,
            &staff,
            &MedicalOrderFilter { order_type: Some("LAB".into()), ..Default::default() },
        )
        .await
        .unwrap();
        assert_eq!(labs.len(), 1);

        let done = update_status(&pool, &staff, order.id, "completed").await.unwrap();
        assert_eq!(done.status, "completed");
        let completed = list(
            &pool,
            &staff,
            &MedicalOrderFilter { status: Some("completed".into()), ..Default::default() },
        )
        .await
        .unwrap();
        assert_eq!(completed.len(), 1);
    }

    #[tokio::test]
    async fn date_range_filter_brackets_creation() {
        let pool = test_pool().await;
        let staff = identity(&pool, seed_user(&pool, "s@h.test", "staff").await).await;
        let p1 = seed_patient(&pool, "MRN-1", "One").await;
        let admission_id = seed_admission(&pool, p1, "active").await;
        let before = Utc::now() - chrono::Duration::minutes(1);

        create(
            &pool,
            &staff,
            &NewMedicalOrder { admission_id, order_type: "lab".into(), payload: None },
        )
        .await
        .unwrap();
        let after = Utc::now() + chrono::Duration::minutes(1);

        let inside = list(
            &pool,
            &staff,
            &MedicalOrderFilter {
                created_from: Some(before),
                created_to: Some(after),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(inside.len(), 1);

        let outside = list(
            &pool,
            &staff,
            &MedicalOrderFilter { created_to: Some(before), ..Default::default() },
        )
        .await
        .unwrap();
        assert!(outside.is_empty());
    }

    #[tokio::test]
    async fn guards_hold() {
        let pool = test_pool().await;
        let staff = identity(&pool, seed_user(&pool, "s@h.test", "staff").await).await;
        let guardian = identity(&pool, seed_user(&pool, "g@h.test", "guardian").await).await;

        assert!(matches!(
            list(&pool, &guardian, &MedicalOrderFilter::default()).await,
            Err(CoreError::Forbidden(_))
        ));
        assert!(matches!(
            create(
                &pool,
                &staff,
                &NewMedicalOrder { admission_id: 9999, order_type: "lab".into(), payload: None },
            )
            .await,
            Err(CoreError::NotFound(_))
        ));
    }
}
