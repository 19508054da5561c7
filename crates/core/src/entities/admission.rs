//! Admission and admission-task rows.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A patient occupying a ward/bed for a period.
///
/// At most one admission per patient should carry status `active` at a time.
/// That is an application convention, not a storage constraint; readers pick
/// the most recently admitted active row deterministically when the
/// convention is violated.
#[derive(Clone, Debug, PartialEq, sqlx::FromRow, Serialize, Deserialize, ToSchema)]
pub struct Admission {
    pub id: i64,
    pub patient_id: i64,
    pub ward_id: i64,
    pub bed_id: i64,
    pub doctor_id: Option<i64>,
    pub admit_time: DateTime<Utc>,
    pub discharge_time: Option<DateTime<Utc>>,
    /// active / discharged / ...
    pub status: String,
    pub notes: Option<String>,
}

#[derive(Clone, Debug, PartialEq, sqlx::FromRow, Serialize, Deserialize, ToSchema)]
pub struct AdmissionTask {
    pub id: i64,
    pub admission_id: i64,
    pub title: String,
    pub details: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
