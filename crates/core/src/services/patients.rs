//! Patient master index.

use crate::entities::PatientRecord;
use crate::services::access::{self, PatientScope};
use crate::{CoreError, CoreResult, Identity};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use sqlx::SqlitePool;
use tracing::info;
use utoipa::IntoParams;

/// Recognised listing filters. Unknown query keys are rejected at
/// deserialisation time rather than silently ignored.
#[derive(Debug, Default, Clone, Deserialize, IntoParams)]
#[serde(deny_unknown_fields)]
pub struct PatientFilter {
    /// Case-insensitive substring over name, MRN, address and allergies
    pub q: Option<String>,
    /// Exact medical record number
    pub mrn: Option<String>,
}

/// Fields for a new patient record.
#[derive(Debug, Clone, Deserialize, utoipa::ToSchema)]
pub struct NewPatient {
    pub mrn: String,
    pub first_name: String,
    pub last_name: String,
    pub sex: Option<String>,
    pub dob: Option<NaiveDate>,
    pub blood_group: Option<String>,
    pub allergies: Option<String>,
    pub address: Option<String>,
}

/// Lists patients visible to the caller, newest first.
pub async fn list(
    pool: &SqlitePool,
    identity: &Identity,
    filter: &PatientFilter,
) -> CoreResult<Vec<PatientRecord>> {
    let scope = access::visible_patients(pool, identity).await?;
    let mut sql = String::from("SELECT * FROM patient_record WHERE 1 = 1");
    let mut binds: Vec<String> = Vec::new();

    match &scope {
        PatientScope::All => {}
        PatientScope::Ids(ids) if ids.is_empty() => return Ok(Vec::new()),
        PatientScope::Ids(ids) => {
            sql.push_str(&format!(" AND id IN ({})", id_list(ids)));
        }
    }
    if let Some(q) = filter.q.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
        binds.push(format!("%{q}%"));
        let n = binds.len();
        sql.push_str(&format!(
            " AND (first_name LIKE ?{n} OR last_name LIKE ?{n} OR mrn LIKE ?{n}
                   OR address LIKE ?{n} OR allergies LIKE ?{n})"
        ));
    }
    if let Some(mrn) = filter.mrn.as_deref().map(str::trim).filter(|m| !m.is_empty()) {
        binds.push(mrn.to_string());
        sql.push_str(&format!(" AND mrn = ?{}", binds.len()));
    }
    sql.push_str(" ORDER BY id DESC");

    let mut query = sqlx::query_as::<_, PatientRecord>(&sql);
    for bind in &binds {
        query = query.bind(bind);
    }
    Ok(query.fetch_all(pool).await?)
}

/// Fetches one patient. Out-of-scope ids read as absent, so the response
/// never confirms whether a record exists.
pub async fn get(pool: &SqlitePool, identity: &Identity, id: i64) -> CoreResult<PatientRecord> {
    let scope = access::visible_patients(pool, identity).await?;
    if !scope.permits(id) {
        return Err(CoreError::NotFound("Patient not found.".into()));
    }
    let patient = sqlx::query_as::<_, PatientRecord>("SELECT * FROM patient_record WHERE id = ?1")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| CoreError::NotFound("Patient not found.".into()))?;
    Ok(patient)
}

/// Registers a new patient. Staff only; a duplicate MRN is a conflict.
pub async fn create(
    pool: &SqlitePool,
    identity: &Identity,
    new: &NewPatient,
) -> CoreResult<PatientRecord> {
    access::require_staff(identity)?;
    let mrn = new.mrn.trim();
    if mrn.is_empty() || new.first_name.trim().is_empty() || new.last_name.trim().is_empty() {
        return Err(CoreError::InvalidInput(
            "mrn, first_name and last_name are required.".into(),
        ));
    }

    let id = sqlx::query(
        "INSERT INTO patient_record
            (mrn, first_name, last_name, sex, dob, blood_group, allergies, address, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
    )
    .bind(mrn)
    .bind(new.first_name.trim())
    .bind(new.last_name.trim())
    .bind(new.sex.as_deref())
    .bind(new.dob)
    .bind(new.blood_group.as_deref())
    .bind(new.allergies.as_deref())
    .bind(new.address.as_deref())
    .bind(Utc::now())
    .execute(pool)
    .await?
    .last_insert_rowid();

    info!(patient_id = id, mrn, "patient record created");
    let patient = sqlx::query_as::<_, PatientRecord>("SELECT * FROM patient_record WHERE id = ?1")
        .bind(id)
        .fetch_one(pool)
        .await?;
    Ok(patient)
}

pub(crate) fn id_list(ids: &[i64]) -> String {
    ids.iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::{seed_grant, seed_patient, seed_user, test_pool};
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

    #[tokio::test]
    async fn listing_is_scoped_and_filterable() {
        let pool = test_pool().await;
        let staff_id = seed_user(&pool, "staff@h.test", "staff").await;
        let guardian_id = seed_user(&pool, "g@h.test", "guardian").await;
        let p1 = seed_patient(&pool, "MRN-1", "Ahmed").await;
        let _p2 = seed_patient(&pool, "MRN-2", "Baker").await;
        seed_grant(&pool, guardian_id, p1).await;

        let staff = identity(&pool, staff_id).await;
        let guardian = identity(&pool, guardian_id).await;

        let all = list(&pool, &staff, &PatientFilter::default()).await.unwrap();
        assert_eq!(all.len(), 2);

        let scoped = list(&pool, &guardian, &PatientFilter::default()).await.unwrap();
        assert_eq!(scoped.len(), 1);
        assert_eq!(scoped[0].id, p1);

        let anonymous = list(&pool, &Identity::Anonymous, &PatientFilter::default())
            .await
            .unwrap();
        assert!(anonymous.is_empty());

        let by_name = list(
            &pool,
            &staff,
            &PatientFilter { q: Some("ahm".into()), mrn: None },
        )
        .await
        .unwrap();
        assert_eq!(by_name.len(), 1);

        let by_mrn = list(
            &pool,
            &staff,
            &PatientFilter { q: None, mrn: Some("MRN-2".into()) },
        )
        .await
        .unwrap();
        assert_eq!(by_mrn.len(), 1);
        assert_eq!(by_mrn[0].mrn, "MRN-2");
    }

    #[tokio::test]
    async fn get_reads_out_of_scope_records_as_absent() {
        let pool = test_pool().await;
        let guardian_id = seed_user(&pool, "g@h.test", "guardian").await;
        let p1 = seed_patient(&pool, "MRN-1", "Ahmed").await;
        let p2 = seed_patient(&pool, "MRN-2", "Baker").await;
        seed_grant(&pool, guardian_id, p1).await;
        let guardian = identity(&pool, guardian_id).await;

        assert_eq!(get(&pool, &guardian, p1).await.unwrap().id, p1);
        assert!(matches!(
            get(&pool, &guardian, p2).await,
            Err(CoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn create_requires_staff_and_rejects_duplicate_mrn() {
        let pool = test_pool().await;
        let staff_id = seed_user(&pool, "staff@h.test", "staff").await;
        let guardian_id = seed_user(&pool, "g@h.test", "guardian").await;
        let staff = identity(&pool, staff_id).await;
        let guardian = identity(&pool, guardian_id).await;

        let new = NewPatient {
            mrn: "MRN-9".into(),
            first_name: "Sam".into(),
            last_name: "Ng".into(),
            sex: None,
            dob: None,
            blood_group: None,
            allergies: None,
            address: None,
        };
        let created = create(&pool, &staff, &new).await.unwrap();
        assert_eq!(created.mrn, "MRN-9");

        assert!(matches!(
            create(&pool, &staff, &new).await,
            Err(CoreError::Conflict(_))
        ));
        assert!(matches!(
            create(&pool, &guardian, &new).await,
            Err(CoreError::Forbidden(_))
        ));
    }
}
