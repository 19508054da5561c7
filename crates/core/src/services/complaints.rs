//! Complaints raised against a patient's stay.

use crate::entities::Complaint;
use crate::services::access::{self, PatientScope};
use crate::services::{admissions, patients::id_list, Bind};
use crate::{CoreError, CoreResult, Identity};
use chrono::Utc;
use serde::Deserialize;
use sqlx::SqlitePool;
use tracing::info;
use utoipa::IntoParams;

#[derive(Debug, Default, Clone, Deserialize, IntoParams)]
#[serde(deny_unknown_fields)]
pub struct ComplaintFilter {
    pub patient_id: Option<i64>,
    pub status: Option<String>,
    pub category: Option<String>,
    /// Restrict to the caller's own complaints
    pub mine: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, utoipa::ToSchema)]
pub struct NewComplaint {
    pub patient_id: i64,
    pub category: Option<String>,
    pub description: String,
    /// Auto-filled from the patient's active admission when omitted
    pub admission_id: Option<i64>,
    pub ward_id: Option<i64>,
    pub bed_id: Option<i64>,
}

/// Files a complaint for a patient the caller may act on.
///
/// Ward, bed and admission fall back to the patient's active admission
/// context when the caller leaves them blank; a patient without an active
/// admission simply gets a complaint with those fields unset.
pub async fn create(
    pool: &SqlitePool,
    identity: &Identity,
    new: &NewComplaint,
) -> CoreResult<Complaint> {
    let user = access::require_account(identity)?;
    access::authorize_patient(pool, identity, new.patient_id).await?;
    if new.description.trim().is_empty() {
        return Err(CoreError::InvalidInput("Description is required.".into()));
    }

    let context = if new.admission_id.is_none() || new.ward_id.is_none() || new.bed_id.is_none() {
        admissions::active_admission(pool, new.patient_id).await?
    } else {
        None
    };
    let admission_id = new.admission_id.or(context.as_ref().map(|a| a.id));
    let ward_id = new.ward_id.or(context.as_ref().map(|a| a.ward_id));
    let bed_id = new.bed_id.or(context.as_ref().map(|a| a.bed_id));

    let id = sqlx::query(
        "INSERT INTO complaint
            (user_id, patient_id, admission_id, ward_id, bed_id, category, description, status, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 'open', ?8)",
    )
    .bind(user.id)
    .bind(new.patient_id)
    .bind(admission_id)
    .bind(ward_id)
    .bind(bed_id)
    .bind(new.category.as_deref())
    .bind(new.description.trim())
    .bind(Utc::now())
    .execute(pool)
    .await?
    .last_insert_rowid();

    info!(complaint_id = id, patient_id = new.patient_id, "complaint filed");
    fetch(pool, id).await
}

/// Lists complaints within the caller's patient scope.
pub async fn list(
    pool: &SqlitePool,
    identity: &Identity,
    filter: &ComplaintFilter,
) -> CoreResult<Vec<Complaint>> {
    let scope = access::visible_patients(pool, identity).await?;
    let mut sql = String::from("SELECT * FROM complaint WHERE 1 = 1");
    let mut binds: Vec<Bind> = Vec::new();

    match &scope {
        PatientScope::All => {}
        PatientScope::Ids(ids) if ids.is_empty() => return Ok(Vec::new()),
        PatientScope::Ids(ids) => sql.push_str(&format!(" AND patient_id IN ({})", id_list(ids))),
    }
    if filter.mine.unwrap_or(false) {
        let user = access::require_account(identity)?;
        binds.push(Bind::Int(user.id));
        sql.push_str(&format!(" AND user_id = ?{}", binds.len()));
    }
    if let Some(patient_id) = filter.patient_id {
        binds.push(Bind::Int(patient_id));
        sql.push_str(&format!(" AND patient_id = ?{}", binds.len()));
    }
    if let Some(status) = filter.status.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        binds.push(Bind::Text(status.to_lowercase()));
        sql.push_str(&format!(" AND LOWER(status) = ?{}", binds.len()));
    }
    if let Some(category) = filter.category.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
        binds.push(Bind::Text(category.to_lowercase()));
        sql.push_str(&format!(" AND LOWER(category) = ?{}", binds.len()));
    }
    sql.push_str(" ORDER BY id DESC");

    let mut query = sqlx::query_as::<_, Complaint>(&sql);
    for bind in binds {
        query = match bind {
            Bind::Text(text) => query.bind(text),
            Bind::Int(int) => query.bind(int),
            Bind::At(at) => query.bind(at),
        };
    }
    Ok(query.fetch_all(pool).await?)
}

/// Staff move a complaint through its lifecycle; `resolved` stamps
/// `resolved_at`.
pub async fn update_status(
    pool: &SqlitePool,
    identity: &Identity,
    id: i64,
    status: &str,
) -> CoreResult<Complaint> {
    access::require_staff(identity)?;
    let status = status.trim().to_lowercase();
    if !matches!(status.as_str(), "open" | "in_progress" | "resolved") {
        return Err(CoreError::InvalidInput(
            "status must be open, in_progress or resolved.".into(),
        ));
    }

    let resolved_at = (status == "resolved").then(Utc::now);
    let affected = sqlx::query(
        "UPDATE complaint SET status = ?1, resolved_at = COALESCE(?2, resolved_at) WHERE id = ?3",
    )
    .bind(&status)
    .bind(resolved_at)
    .bind(id)
    .execute(pool)
    .await?
    .rows_affected();
    if affected == 0 {
        return Err(CoreError::NotFound("Complaint not found.".into()));
    }
    fetch(pool, id).await
}

async fn fetch(pool: &SqlitePool, id: i64) -> CoreResult<Complaint> {
    let complaint = sqlx::query_as::<_, Complaint>("SELECT * FROM complaint WHERE id = ?1")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| CoreError::NotFound("Complaint not found.".into()))?;
    Ok(complaint)
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

    fn new_complaint(patient_id: i64) -> NewComplaint {
        NewComplaint {
            patient_id,
            category: Some("food".into()),
            description: "Cold meals two days running".into(),
            admission_id: None,
            ward_id: None,
            bed_id: None,
        }
    }

    #[tokio::test]
    async fn ward_and_bed_autofill_from_the_active_admission() {
        let pool = test_pool().await;
        let guardian_id = seed_user(&pool, "g@h.test", "guardian").await;
        let p1 = seed_patient(&pool, "MRN-1", "One").await;
        seed_grant(&pool, guardian_id, p1).await;
        let admission_id = seed_admission(&pool, p1, "active").await;
        let guardian = identity(&pool, guardian_id).await;

        let complaint = create(&pool, &guardian, &new_complaint(p1)).await.unwrap();
        assert_eq!(complaint.admission_id, Some(admission_id));
        assert!(complaint.ward_id.is_some());
        assert!(complaint.bed_id.is_some());
        assert_eq!(complaint.status, "open");
    }

    #[tokio::test]
    async fn no_active_admission_leaves_context_unset() {
        let pool = test_pool().await;
        let guardian_id = seed_user(&pool, "g@h.test", "guardian").await;
        let p1 = seed_patient(&pool, "MRN-1", "One").await;
        seed_grant(&pool, guardian_id, p1).await;
        seed_admission(&pool, p1, "discharged").await;
        let guardian = identity(&pool, guardian_id).await;

        let complaint = create(&pool, &guardian, &new_complaint(p1)).await.unwrap();
        assert!(complaint.admission_id.is_none());
        assert!(complaint.ward_id.is_none());
    }

    #[tokio::test]
    async fn creation_enforces_the_grant_set() {
        let pool = test_pool().await;
        let guardian_id = seed_user(&pool, "g@h.test", "guardian").await;
        let p1 = seed_patient(&pool, "MRN-1", "One").await;
        let guardian = identity(&pool, guardian_id).await;

        assert!(matches!(
            create(&pool, &guardian, &new_complaint(p1)).await,
            Err(CoreError::Forbidden(_))
        ));
        assert!(matches!(
            create(&pool, &Identity::Anonymous, &new_complaint(p1)).await,
            Err(CoreError::Unauthorized(_))
        ));
    }

    #[tokio::test]
    async fn listing_scopes_and_mine_narrows_further() {
        let pool = test_pool().await;
        let g1 = seed_user(&pool, "g1@h.test", "guardian").await;
        let g2 = seed_user(&pool, "g2@h.test", "guardian").await;
        let staff = identity(&pool, seed_user(&pool, "s@h.test", "staff").await).await;
        let p1 = seed_patient(&pool, "MRN-1", "One").await;
        seed_grant(&pool, g1, p1).await;
        seed_grant(&pool, g2, p1).await;

        let a = identity(&pool, g1).await;
        let b = identity(&pool, g2).await;
        create(&pool, &a, &new_complaint(p1)).await.unwrap();
        create(&pool, &b, &new_complaint(p1)).await.unwrap();

        assert_eq!(list(&pool, &staff, &ComplaintFilter::default()).await.unwrap().len(), 2);
        // Both guardians share the patient, so both see both complaints.
        assert_eq!(list(&pool, &a, &ComplaintFilter::default()).await.unwrap().len(), 2);
        let mine = list(
            &pool,
            &a,
            &ComplaintFilter { mine: Some(true), ..Default::default() },
        )
        .await
        .unwrap();
        assert_eq!(mine.len(), 1);
        assert!(list(&pool, &Identity::Anonymous, &ComplaintFilter::default())
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn resolving_stamps_resolved_at() {
        let pool = test_pool().await;
        let guardian_id = seed_user(&pool, "g@h.test", "guardian").await;
        let staff = identity(&pool, seed_user(&pool, "s@h.test", "staff").await).await;
        let p1 = seed_patient(&pool, "MRN-1", "One").await;
        seed_grant(&pool, guardian_id, p1).await;
        let guardian = identity(&pool, guardian_id).await;

        let complaint = create(&pool, &guardian, &new_complaint(p1)).await.unwrap();
        let moved = update_status(&pool, &staff, complaint.id, "in_progress").await.unwrap();
        assert!(moved.resolved_at.is_none());

        let resolved = update_status(&pool, &staff, complaint.id, "Resolved").await.unwrap();
        assert_eq!(resolved.status, "resolved");
        assert!(resolved.resolved_at.is_some());

        assert!(matches!(
            update_status(&pool, &staff, complaint.id, "bogus").await,
            Err(CoreError::InvalidInput(_))
        ));
        assert!(matches!(
            update_status(&pool, &guardian, complaint.id, "resolved").await,
            Err(CoreError::Forbidden(_))
        ));
    }
}
