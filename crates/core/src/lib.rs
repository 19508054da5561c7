//! Core domain logic for the healthvault hospital backend.
//!
//! Everything the REST layer exposes lives here: the row types for the
//! externally owned schema, the identity resolver, and one service module
//! per domain slice. The REST crate translates HTTP in and out; it makes no
//! decisions of its own.

pub mod config;
pub mod db;
pub mod entities;
pub mod error;
pub mod hashing;
pub mod identity;
pub mod services;

pub use config::CoreConfig;
pub use error::{CoreError, CoreResult};
pub use identity::Identity;
