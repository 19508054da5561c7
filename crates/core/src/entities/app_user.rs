//! AppUser row — mobile/guardian-facing accounts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// An account authenticated via bearer token, distinct from patients
/// themselves. Staff accounts live in the same table with role `staff`.
#[derive(Clone, Debug, PartialEq, sqlx::FromRow, Serialize, Deserialize, ToSchema)]
pub struct AppUser {
    pub id: i64,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub username: Option<String>,
    /// Salted hash; never serialised out verbatim by the REST layer
    #[serde(skip_serializing)]
    pub password_hash: Option<String>,
    /// patient / guardian / staff
    pub role: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl AppUser {
    /// True when the account carries the staff role.
    #[must_use]
    pub fn is_staff(&self) -> bool {
        self.role.as_deref() == Some("staff")
    }
}
