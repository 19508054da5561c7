//! Medical order row (labs, imaging, pharmacy requests against an admission).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, sqlx::FromRow, Serialize, Deserialize, ToSchema)]
pub struct MedicalOrder {
    pub id: i64,
    pub admission_id: i64,
    pub created_by: i64,
    /// lab / imaging / pharmacy / ...
    pub order_type: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    /// Free-form structured payload, stored as JSON text
    pub payload_json: Option<String>,
}
