//! Master data rows: departments, wards, beds, doctors.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, sqlx::FromRow, Serialize, Deserialize, ToSchema)]
pub struct Department {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, sqlx::FromRow, Serialize, Deserialize, ToSchema)]
pub struct Ward {
    pub id: i64,
    pub department_id: Option<i64>,
    pub name: String,
    pub floor: Option<i64>,
    pub notes: Option<String>,
}

#[derive(Clone, Debug, PartialEq, sqlx::FromRow, Serialize, Deserialize, ToSchema)]
pub struct Bed {
    pub id: i64,
    pub ward_id: i64,
    pub code: String,
    /// e.g. available / occupied / reserved
    pub status: String,
}

#[derive(Clone, Debug, PartialEq, sqlx::FromRow, Serialize, Deserialize, ToSchema)]
pub struct Doctor {
    pub id: i64,
    pub department_id: Option<i64>,
    pub full_name: String,
    pub qualification: Option<String>,
    pub experience_years: Option<i64>,
}
