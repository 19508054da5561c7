//! Row types for the externally owned healthvault schema.
//!
//! One struct per table, derived with `sqlx::FromRow` for reads and `serde`
//! for the REST layer. The schema itself is not managed here; see
//! [`crate::db::apply_schema`] for the test/bootstrap mirror of it.

pub mod access;
pub mod admission;
pub mod app_user;
pub mod booking;
pub mod canteen;
pub mod complaint;
pub mod masters;
pub mod medical_order;
pub mod notification;
pub mod otp;
pub mod patient;
pub mod report;

pub use access::PatientAccess;
pub use admission::{Admission, AdmissionTask};
pub use app_user::AppUser;
pub use booking::Booking;
pub use canteen::{CanteenOrder, CanteenOrderItem, MenuItem};
pub use complaint::Complaint;
pub use masters::{Bed, Department, Doctor, Ward};
pub use medical_order::MedicalOrder;
pub use notification::Notification;
pub use otp::OtpCode;
pub use patient::PatientRecord;
pub use report::Report;
