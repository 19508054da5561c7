//! Request and response bodies for the REST surface.
//!
//! Service-level inputs (`NewPatient`, filter structs and friends) are
//! deserialised directly from the wire in the handlers; the types here cover
//! everything that has no one-to-one service counterpart.

use healthvault_core::entities::AppUser;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthRes {
    pub ok: bool,
    pub message: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct OtpSendReq {
    pub destination: String,
    #[serde(default)]
    pub purpose: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OtpSendRes {
    pub ok: bool,
    pub destination: String,
    /// Seconds until the code expires
    pub expires_in: i64,
    /// Echoed only when debug echo is enabled
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debug_code: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct OtpVerifyReq {
    pub destination: String,
    #[serde(default)]
    pub purpose: Option<String>,
    pub code: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OtpVerifyRes {
    pub valid: bool,
    pub destination: String,
    pub purpose: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SignupVerifyReq {
    pub destination: String,
    pub code: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct OtpLoginReq {
    pub destination: String,
    pub code: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct PasswordLoginReq {
    /// Username or email
    pub destination: String,
    pub password: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct StaffLoginReq {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AuthRes {
    pub token: String,
    pub app_user: AppUser,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SlotsRes {
    pub doctor: i64,
    pub date: String,
    pub start: String,
    pub end: String,
    pub step_minutes: i64,
    pub slots: Vec<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateOrderReq {
    #[serde(default)]
    pub patient_id: Option<i64>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddItemReq {
    pub menu_item: i64,
    pub qty: i64,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateItemReq {
    pub qty: i64,
    /// Administrative price override in minor units
    #[serde(default)]
    pub price_cents: Option<i64>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct StatusReq {
    pub status: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct GrantReq {
    pub user_id: i64,
    pub patient_id: i64,
    #[serde(default)]
    pub relationship: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct DepartmentReq {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct WardReq {
    #[serde(default)]
    pub department_id: Option<i64>,
    pub name: String,
    #[serde(default)]
    pub floor: Option<i64>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct BedReq {
    pub ward_id: i64,
    pub code: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct DoctorReq {
    #[serde(default)]
    pub department_id: Option<i64>,
    pub full_name: String,
    #[serde(default)]
    pub qualification: Option<String>,
    #[serde(default)]
    pub experience_years: Option<i64>,
}
