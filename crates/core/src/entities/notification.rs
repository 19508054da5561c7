//! Notification row.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Staff-authored message; a NULL target is a broadcast, visible to AppUsers
/// only while one of their granted patients has an active admission.
#[derive(Clone, Debug, PartialEq, sqlx::FromRow, Serialize, Deserialize, ToSchema)]
pub struct Notification {
    pub id: i64,
    pub created_by: i64,
    pub target_user_id: Option<i64>,
    pub title: String,
    pub message: String,
    pub channels: String,
    pub created_at: DateTime<Utc>,
    pub read_at: Option<DateTime<Utc>>,
}
