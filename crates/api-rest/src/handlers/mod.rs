//! Request handlers, one module per resource.

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
