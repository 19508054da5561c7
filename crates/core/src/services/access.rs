//! Patient access grants and visibility scoping.
//!
//! Grants tie an AppUser to a patient. Staff identities bypass the grant
//! table entirely; anonymous callers see nothing. The [`PatientScope`]
//! returned here is what every patient-scoped listing filters against.

use crate::entities::PatientAccess;
use crate::{CoreError, CoreResult, Identity};
use sqlx::SqlitePool;
use tracing::debug;

/// The set of patients a caller may see.
#[derive(Debug, Clone, PartialEq)]
pub enum PatientScope {
    /// Staff: no restriction
    All,
    /// Restricted to these patient ids (empty for anonymous callers)
    Ids(Vec<i64>),
}

impl PatientScope {
    #[must_use]
    pub fn permits(&self, patient_id: i64) -> bool {
        match self {
            PatientScope::All => true,
            PatientScope::Ids(ids) => ids.contains(&patient_id),
        }
    }
}

/// Resolves the caller's patient visibility scope.
pub async fn visible_patients(pool: &SqlitePool, identity: &Identity) -> CoreResult<PatientScope> {
    match identity {
        Identity::Staff(_) => Ok(PatientScope::All),
        Identity::Anonymous => Ok(PatientScope::Ids(Vec::new())),
        Identity::AppUser(user) => {
            let ids: Vec<i64> = sqlx::query_scalar(
                "SELECT patient_id FROM patient_access WHERE user_id = ?1 ORDER BY patient_id",
            )
            .bind(user.id)
            .fetch_all(pool)
            .await?;
            Ok(PatientScope::Ids(ids))
        }
    }
}

/// Checks that the caller may act on `patient_id`, distinguishing "no
/// identity" from "identity without rights".
pub async fn authorize_patient(
    pool: &SqlitePool,
    identity: &Identity,
    patient_id: i64,
) -> CoreResult<()> {
    match identity {
        Identity::Staff(_) => Ok(()),
        Identity::Anonymous => Err(CoreError::Unauthorized("Authentication required.".into())),
        Identity::AppUser(user) => {
            let granted: Option<i64> = sqlx::query_scalar(
                "SELECT id FROM patient_access WHERE user_id = ?1 AND patient_id = ?2",
            )
            .bind(user.id)
            .bind(patient_id)
            .fetch_optional(pool)
            .await?;
            if granted.is_some() {
                Ok(())
            } else {
                Err(CoreError::Forbidden(
                    "No access to this patient.".into(),
                ))
            }
        }
    }
}

/// Grants `user_id` access to `patient_id`. A duplicate grant is a conflict.
pub async fn grant(
    pool: &SqlitePool,
    identity: &Identity,
    user_id: i64,
    patient_id: i64,
    relationship: Option<&str>,
) -> CoreResult<PatientAccess> {
    require_staff(identity)?;

    let patient_exists: Option<i64> = sqlx::query_scalar("SELECT id FROM patient_record WHERE id = ?1")
        .bind(patient_id)
        .fetch_optional(pool)
        .await?;
    if patient_exists.is_none() {
        return Err(CoreError::NotFound("Patient not found.".into()));
    }
    let user_exists: Option<i64> =
        sqlx::query_scalar("SELECT id FROM app_user WHERE id = ?1 AND is_active = 1")
            .bind(user_id)
            .fetch_optional(pool)
            .await?;
    if user_exists.is_none() {
        return Err(CoreError::NotFound("User not found.".into()));
    }

    let id = sqlx::query(
        "INSERT INTO patient_access (user_id, patient_id, relationship) VALUES (?1, ?2, ?3)",
    )
    .bind(user_id)
    .bind(patient_id)
    .bind(relationship)
    .execute(pool)
    .await?
    .last_insert_rowid();

    debug!(user_id, patient_id, "patient access granted");
    fetch_grant(pool, id).await
}

/// Removes a grant. Missing grants are a 404, not a silent success.
pub async fn revoke(
    pool: &SqlitePool,
    identity: &Identity,
    user_id: i64,
    patient_id: i64,
) -> CoreResult<()> {
    require_staff(identity)?;
    let affected = sqlx::query(
        "DELETE FROM patient_access WHERE user_id = ?1 AND patient_id = ?2",
    )
    .bind(user_id)
    .bind(patient_id)
    .execute(pool)
    .await?
    .rows_affected();
    if affected == 0 {
        return Err(CoreError::NotFound("Grant not found.".into()));
    }
    Ok(())
}

/// Lists grants: staff may inspect anyone's, AppUsers only their own.
pub async fn list_grants(
    pool: &SqlitePool,
    identity: &Identity,
    user_id: Option<i64>,
) -> CoreResult<Vec<PatientAccess>> {
    let subject = match identity {
        Identity::Staff(staff) => user_id.unwrap_or(staff.id),
        Identity::AppUser(user) => user.id,
        Identity::Anonymous => {
            return Err(CoreError::Unauthorized("Authentication required.".into()))
        }
    };
    let grants = sqlx::query_as::<_, PatientAccess>(
        "SELECT * FROM patient_access WHERE user_id = ?1 ORDER BY id",
    )
    .bind(subject)
    .fetch_all(pool)
    .await?;
    Ok(grants)
}

async fn fetch_grant(pool: &SqlitePool, id: i64) -> CoreResult<PatientAccess> {
    let grant = sqlx::query_as::<_, PatientAccess>("SELECT * FROM patient_access WHERE id = ?1")
        .bind(id)
        .fetch_one(pool)
        .await?;
    Ok(grant)
}

pub(crate) fn require_staff(identity: &Identity) -> CoreResult<()> {
    match identity {
        Identity::Staff(_) => Ok(()),
        Identity::Anonymous => Err(CoreError::Unauthorized("Authentication required.".into())),
        Identity::AppUser(_) => Err(CoreError::Forbidden("Staff access required.".into())),
    }
}

pub(crate) fn require_account(identity: &Identity) -> CoreResult<&crate::entities::AppUser> {
    identity
        .account()
        .ok_or_else(|| CoreError::Unauthorized("Authentication required.".into()))
}
