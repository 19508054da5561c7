//! Booking row — appointments and lab slots.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, sqlx::FromRow, Serialize, Deserialize, ToSchema)]
pub struct Booking {
    pub id: i64,
    pub user_id: i64,
    pub patient_id: Option<i64>,
    /// appointment / lab
    pub booking_type: String,
    pub department_id: Option<i64>,
    pub doctor_id: Option<i64>,
    pub slot_date: NaiveDate,
    pub slot_time: NaiveTime,
    /// Non-cancelled bookings block their slot in the availability listing
    pub status: String,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}
