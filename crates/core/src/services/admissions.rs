//! Admissions and their task lists.

use crate::entities::{Admission, AdmissionTask};
use crate::services::access::{self, PatientScope};
use crate::services::patients::id_list;
use crate::services::Bind;
use crate::{CoreError, CoreResult, Identity};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use sqlx::SqlitePool;
use tracing::info;
use utoipa::IntoParams;

#[derive(Debug, Default, Clone, Deserialize, IntoParams)]
#[serde(deny_unknown_fields)]
pub struct AdmissionFilter {
    pub patient_id: Option<i64>,
    pub ward_id: Option<i64>,
    pub doctor_id: Option<i64>,
    /// Case-insensitive status match
    pub status: Option<String>,
    /// Shorthand for status = active
    pub active_only: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, utoipa::ToSchema)]
pub struct NewAdmission {
    pub patient_id: i64,
    pub ward_id: i64,
    pub bed_id: i64,
    pub doctor_id: Option<i64>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize, utoipa::ToSchema)]
pub struct NewTask {
    pub title: String,
    pub details: Option<String>,
    pub due_date: Option<NaiveDate>,
}

/// The patient's one active admission, read deterministically.
///
/// The single-active-admission rule is an application convention, so this
/// takes the most recently admitted active row (id breaks ties) and never
/// errors when the convention has been violated.
pub async fn active_admission(pool: &SqlitePool, patient_id: i64) -> CoreResult<Option<Admission>> {
    let admission = sqlx::query_as::<_, Admission>(
        "SELECT * FROM admission
         WHERE patient_id = ?1 AND LOWER(status) = 'active'
         ORDER BY admit_time DESC, id DESC
         LIMIT 1",
    )
    .bind(patient_id)
    .fetch_optional(pool)
    .await?;
    Ok(admission)
}

pub async fn list(
    pool: &SqlitePool,
    identity: &Identity,
    filter: &AdmissionFilter,
) -> CoreResult<Vec<Admission>> {
    let scope = access::visible_patients(pool, identity).await?;
    let mut sql = String::from("SELECT * FROM admission WHERE 1 = 1");
    let mut binds: Vec<Bind> = Vec::new();

    match &scope {
        PatientScope::All => {}
        PatientScope::Ids(ids) if ids.is_empty() => return Ok(Vec::new()),
        PatientScope::Ids(ids) => sql.push_str(&format!(" AND patient_id IN ({})", id_list(ids))),
    }
    if let Some(patient_id) = filter.patient_id {
        binds.push(Bind::Int(patient_id));
        sql.push_str(&format!(" AND patient_id = ?{}", binds.len()));
    }
    if let Some(ward_id) = filter.ward_id {
        binds.push(Bind::Int(ward_id));
        sql.push_str(&format!(" AND ward_id = ?{}", binds.len()));
    }
    if let Some(doctor_id) = filter.doctor_id {
        binds.push(Bind::Int(doctor_id));
        sql.push_str(&format!(" AND doctor_id = ?{}", binds.len()));
    }
    if let Some(status) = filter.status.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        binds.push(Bind::Text(status.to_lowercase()));
        sql.push_str(&format!(" AND LOWER(status) = ?{}", binds.len()));
    }
    if filter.active_only.unwrap_or(false) {
        sql.push_str(" AND LOWER(status) = 'active'");
    }
    sql.push_str(" ORDER BY admit_time DESC, id DESC");

    let mut query = sqlx::query_as::<_, Admission>(&sql);
    for bind in binds {
        query = match bind {
            Bind::Text(text) => query.bind(text),
            Bind::Int(int) => query.bind(int),
            Bind::At(at) => query.bind(at),
        };
    }
    Ok(query.fetch_all(pool).await?)
}

pub async fn get(pool: &SqlitePool, identity: &Identity, id: i64) -> CoreResult<Admission> {
    let admission = sqlx::query_as::<_, Admission>("SELECT * FROM admission WHERE id = ?1")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| CoreError::NotFound("Admission not found.".into()))?;
    let scope = access::visible_patients(pool, identity).await?;
    if !scope.permits(admission.patient_id) {
        return Err(CoreError::NotFound("Admission not found.".into()));
    }
    Ok(admission)
}

/// Admits a patient into a bed. Staff only.
///
/// The bed must currently be available; it flips to occupied in the same
/// transaction as the admission insert.
pub async fn create(
    pool: &SqlitePool,
    identity: &Identity,
    new: &NewAdmission,
) -> CoreResult<Admission> {
    access::require_staff(identity)?;

    let mut tx = pool.begin().await?;
    let patient: Option<i64> = sqlx::query_scalar("SELECT id FROM patient_record WHERE id = ?1")
        .bind(new.patient_id)
        .fetch_optional(&mut *tx)
        .await?;
    if patient.is_none() {
        return Err(CoreError::NotFound("Patient not found.".into()));
    }
    let bed_status: Option<String> =
        sqlx::query_scalar("SELECT status FROM bed WHERE id = ?1 AND ward_id = ?2")
            .bind(new.bed_id)
            .bind(new.ward_id)
            .fetch_optional(&mut *tx)
            .await?;
    match bed_status.as_deref() {
        None => return Err(CoreError::NotFound("Bed not found in that ward.".into())),
        Some(status) if !status.eq_ignore_ascii_case("available") => {
            return Err(CoreError::Conflict("Bed is not available.".into()))
        }
        Some(_) => {}
    }

    let id = sqlx::query(
        "INSERT INTO admission (patient_id, ward_id, bed_id, doctor_id, admit_time, status, notes)
         VALUES (?1, ?2, ?3, ?4, ?5, 'active', ?6)",
    )
    .bind(new.patient_id)
    .bind(new.ward_id)
    .bind(new.bed_id)
    .bind(new.doctor_id)
    .bind(Utc::now())
    .bind(new.notes.as_deref())
    .execute(&mut *tx)
    .await?
    .last_insert_rowid();

    sqlx::query("UPDATE bed SET status = 'occupied' WHERE id = ?1")
        .bind(new.bed_id)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;

    info!(admission_id = id, patient_id = new.patient_id, "patient admitted");
    let admission = sqlx::query_as::<_, Admission>("SELECT * FROM admission WHERE id = ?1")
        .bind(id)
        .fetch_one(pool)
        .await?;
    Ok(admission)
}

/// Ends an active admission and frees its bed. Staff only.
pub async fn discharge(pool: &SqlitePool, identity: &Identity, id: i64) -> CoreResult<Admission> {
    access::require_staff(identity)?;

    let mut tx = pool.begin().await?;
    let admission = sqlx::query_as::<_, Admission>("SELECT * FROM admission WHERE id = ?1")
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| CoreError::NotFound("Admission not found.".into()))?;
    if !admission.status.eq_ignore_ascii_case("active") {
        return Err(CoreError::InvalidInput("Admission is not active.".into()));
    }

    sqlx::query("UPDATE admission SET status = 'discharged', discharge_time = ?1 WHERE id = ?2")
        .bind(Utc::now())
        .bind(id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("UPDATE bed SET status = 'available' WHERE id = ?1")
        .bind(admission.bed_id)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;

    info!(admission_id = id, "patient discharged");
    let admission = sqlx::query_as::<_, Admission>("SELECT * FROM admission WHERE id = ?1")
        .bind(id)
        .fetch_one(pool)
        .await?;
    Ok(admission)
}

pub async fn list_tasks(
    pool: &SqlitePool,
    identity: &Identity,
    admission_id: i64,
) -> CoreResult<Vec<AdmissionTask>> {
    // Scope check rides on the admission read.
    get(pool, identity, admission_id).await?;
    let tasks = sqlx::query_as::<_, AdmissionTask>(
        "SELECT * FROM admission_task WHERE admission_id = ?1 ORDER BY id",
    )
    .bind(admission_id)
    .fetch_all(pool)
    .await?;
    Ok(tasks)
}

pub async fn create_task(
    pool: &SqlitePool,
    identity: &Identity,
    admission_id: i64,
    new: &NewTask,
) -> CoreResult<AdmissionTask> {
    access::require_staff(identity)?;
    get(pool, identity, admission_id).await?;
    if new.title.trim().is_empty() {
        return Err(CoreError::InvalidInput("Task title is required.".into()));
    }

    let now = Utc::now();
    let id = sqlx::query(
        "INSERT INTO admission_task (admission_id, title, details, due_date, status, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, 'pending', ?5, ?5)",
    )
    .bind(admission_id)
    .bind(new.title.trim())
    .bind(new.details.as_deref())
    .bind(new.due_date)
    .bind(now)
    .execute(pool)
    .await?
    .last_insert_rowid();

    let task = sqlx::query_as::<_, AdmissionTask>("SELECT * FROM admission_task WHERE id = ?1")
        .bind(id)
        .fetch_one(pool)
        .await?;
    Ok(task)
}

pub async fn update_task_status(
    pool: &SqlitePool,
    identity: &Identity,
    task_id: i64,
    status: &str,
) -> CoreResult<AdmissionTask> {
    access::require_staff(identity)?;
    let status = status.trim().to_lowercase();
    if status.is_empty() {
        return Err(CoreError::InvalidInput("Status is required.".into()));
    }

    let affected = sqlx::query("UPDATE admission_task SET status = ?1, updated_at = ?2 WHERE id = ?3")
        .bind(&status)
        .bind(Utc::now())
        .bind(task_id)
        .execute(pool)
        .await?
        .rows_affected();
    if affected == 0 {
        return Err(CoreError::NotFound("Task not found.".into()));
    }

    let task = sqlx::query_as::<_, AdmissionTask>("SELECT * FROM admission_task WHERE id = ?1")
        .bind(task_id)
        .fetch_one(pool)
        .await?;
    Ok(task)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::{seed_admission, seed_grant, seed_patient, seed_user, test_pool};
    use crate::entities::AppUser;
    use chrono::Duration;

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

    async fn seed_ward_and_bed(pool: &SqlitePool, bed_status: &str) -> (i64, i64) {
        let ward_id = sqlx::query("INSERT INTO ward (name) VALUES ('Ward B')")
            .execute(pool)
            .await
            .unwrap()
            .last_insert_rowid();
        let bed_id = sqlx::query("INSERT INTO bed (ward_id, code, status) VALUES (?1, 'B1', ?2)")
            .bind(ward_id)
            .bind(bed_status)
            .execute(pool)
            .await
            .unwrap()
            .last_insert_rowid();
        (ward_id, bed_id)
    }

    #[tokio::test]
    async fn active_admission_picks_newest_deterministically() {
        let pool = test_pool().await;
        let p1 = seed_patient(&pool, "MRN-1", "One").await;
        let _older = seed_admission(&pool, p1, "Active").await;
        // The convention says one active row; when violated the newest
        // admit_time wins, id breaking exact ties.
        let base = Utc::now();
        let newer = sqlx::query(
            "INSERT INTO admission (patient_id, ward_id, bed_id, admit_time, status)
             VALUES (?1, 1, 1, ?2, 'ACTIVE')",
        )
        .bind(p1)
        .bind(base + Duration::hours(1))
        .execute(&pool)
        .await
        .unwrap()
        .last_insert_rowid();

        let active = active_admission(&pool, p1).await.unwrap().unwrap();
        assert_eq!(active.id, newer);

        let p2 = seed_patient(&pool, "MRN-2", "Two").await;
        assert!(active_admission(&pool, p2).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn admission_occupies_bed_and_discharge_frees_it() {
        let pool = test_pool().await;
        let staff = identity(&pool, seed_user(&pool, "staff@h.test", "staff").await).await;
        let p1 = seed_patient(&pool, "MRN-1", "One").await;
        let (ward_id, bed_id) = seed_ward_and_bed(&pool, "available").await;

        let new = NewAdmission {
            patient_id: p1,
            ward_id,
            bed_id,
            doctor_id: None,
            notes: None,
        };
        let admission = create(&pool, &staff, &new).await.unwrap();
        assert_eq!(admission.status, "active");

        let bed_status: String = sqlx::query_scalar("SELECT status FROM bed WHERE id = ?1")
            .bind(bed_id)
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(bed_status, "occupied");

        // Second admission into the same bed conflicts.
        let p2 = seed_patient(&pool, "MRN-2", "Two").await;
        let clash = create(&pool, &staff, &NewAdmission { patient_id: p2, ..new.clone() }).await;
        assert!(matches!(clash, Err(CoreError::Conflict(_))));

        let discharged = discharge(&pool, &staff, admission.id).await.unwrap();
        assert_eq!(discharged.status, "discharged");
        assert!(discharged.discharge_time.is_some());
        let bed_status: String = sqlx::query_scalar("SELECT status FROM bed WHERE id = ?1")
            .bind(bed_id)
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(bed_status, "available");

        let again = discharge(&pool, &staff, admission.id).await;
        assert!(matches!(again, Err(CoreError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn listing_scopes_to_granted_patients() {
        let pool = test_pool().await;
        let guardian_id = seed_user(&pool, "g@h.test", "guardian").await;
        let p1 = seed_patient(&pool, "MRN-1", "One").await;
        let p2 = seed_patient(&pool, "MRN-2", "Two").await;
        seed_grant(&pool, guardian_id, p1).await;
        let a1 = seed_admission(&pool, p1, "active").await;
        let a2 = seed_admission(&pool, p2, "active").await;
        let guardian = identity(&pool, guardian_id).await;

        let visible = list(&pool, &guardian, &AdmissionFilter::default()).await.unwrap();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].id, a1);

        assert!(get(&pool, &guardian, a1).await.is_ok());
        assert!(matches!(
            get(&pool, &guardian, a2).await,
            Err(CoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn tasks_follow_the_admission_scope() {
        let pool = test_pool().await;
        let staff = identity(&pool, seed_user(&pool, "staff@h.test", "staff").await).await;
        let p1 = seed_patient(&pool, "MRN-1", "One").await;
        let admission_id = seed_admission(&pool, p1, "active").await;

        let task = create_task(
            &pool,
            &staff,
            admission_id,
            &NewTask {
                title: "Morning vitals".into(),
                details: None,
                due_date: None,
            },
        )
        .await
        .unwrap();
        assert_eq!(task.status, "pending");

        let done = update_task_status(&pool, &staff, task.id, "Done").await.unwrap();
        assert_eq!(done.status, "done");
        assert!(done.updated_at >= task.updated_at);

        let tasks = list_tasks(&pool, &staff, admission_id).await.unwrap();
        assert_eq!(tasks.len(), 1);
    }
}
