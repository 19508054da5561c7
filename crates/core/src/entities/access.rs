//! Patient access grant row.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Authorises one AppUser to view/act on one patient's data.
///
/// Unique on `(user_id, patient_id)` at the storage layer; a duplicate grant
/// attempt surfaces as `Conflict`, never as a silent second row.
#[derive(Clone, Debug, PartialEq, sqlx::FromRow, Serialize, Deserialize, ToSchema)]
pub struct PatientAccess {
    pub id: i64,
    pub user_id: i64,
    pub patient_id: i64,
    /// e.g. guardian, parent
    pub relationship: Option<String>,
}
