//! Domain services.
//!
//! Each submodule owns one slice of the hospital domain and exposes free
//! functions taking a pool plus the caller's resolved [`crate::Identity`].
//! Visibility rules live here, not in the REST handlers: listings narrow to
//! what the caller may see and mutations reject callers without rights.

use chrono::{DateTime, Utc};

/// Positional bind for dynamically assembled list queries.
///
/// Values must be bound with their column's type: integer ids as integers and
/// timestamps as timestamps, so the stored and compared encodings agree.
pub(crate) enum Bind {
    Text(String),
    Int(i64),
    At(DateTime<Utc>),
}

pub mod access;
pub mod admissions;
pub mod auth;
pub mod bookings;
pub mod canteen;
pub mod complaints;
pub mod masters;
pub mod medical_orders;
pub mod notifications;
pub mod otp;
pub mod patients;
pub mod reports;
