//! One-time code row.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Stored one-time code. Only the salted hash is persisted; the raw code
/// never touches storage. Multiple outstanding rows per destination may
/// coexist; verification selects the newest unexpired one.
#[derive(Clone, Debug, PartialEq, sqlx::FromRow, Serialize, Deserialize)]
pub struct OtpCode {
    pub id: i64,
    /// Email address or phone number
    pub destination: String,
    /// signup / login / reset
    pub purpose: String,
    /// Hex SHA-256 of salt ++ code
    pub code_hash: String,
    pub salt: String,
    pub expires_at: DateTime<Utc>,
    pub consumed_at: Option<DateTime<Utc>>,
}
