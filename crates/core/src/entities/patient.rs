//! Patient record row.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// One patient in the master index, keyed by medical record number (MRN).
#[derive(Clone, Debug, PartialEq, sqlx::FromRow, Serialize, Deserialize, ToSchema)]
pub struct PatientRecord {
    pub id: i64,
    /// Medical record number; unique across the hospital
    pub mrn: String,
    pub first_name: String,
    pub last_name: String,
    pub sex: Option<String>,
    pub dob: Option<NaiveDate>,
    pub blood_group: Option<String>,
    pub allergies: Option<String>,
    pub address: Option<String>,
    pub created_at: DateTime<Utc>,
}
