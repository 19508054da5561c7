//! Complaint row.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A complaint raised for a patient, usually by a guardian AppUser.
///
/// Admission/ward/bed are auto-filled from the patient's active admission
/// when the caller omits them.
#[derive(Clone, Debug, PartialEq, sqlx::FromRow, Serialize, Deserialize, ToSchema)]
pub struct Complaint {
    pub id: i64,
    pub user_id: i64,
    pub patient_id: i64,
    pub admission_id: Option<i64>,
    pub ward_id: Option<i64>,
    pub bed_id: Option<i64>,
    pub category: Option<String>,
    pub description: String,
    /// open / in_progress / resolved
    pub status: String,
    pub created_at: Option<DateTime<Utc>>,
    pub resolved_at: Option<DateTime<Utc>>,
}
