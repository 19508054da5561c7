//! Report metadata row; the bytes live in the files crate's store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, sqlx::FromRow, Serialize, Deserialize, ToSchema)]
pub struct Report {
    pub id: i64,
    pub patient_id: i64,
    pub admission_id: Option<i64>,
    /// lab / imaging / discharge-summary / ...
    pub report_type: String,
    /// Original filename as uploaded
    pub file_name: String,
    /// Opaque key into the report file store
    pub object_key: String,
    pub mime_type: String,
    pub size_bytes: Option<i64>,
    pub checksum_sha256: Option<String>,
    pub uploaded_by: i64,
    pub uploaded_at: DateTime<Utc>,
    pub notes: Option<String>,
}
