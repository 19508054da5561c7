//! Report file storage
//!
//! This crate stores uploaded report binaries for the healthvault backend and
//! serves them back for download. The relational store only holds metadata
//! (original filename, opaque object key, checksum); the bytes live here.
//!
//! ## Storage model
//!
//! - Every stored file gets a generated opaque object key
//!   (`<uuid-hex><original extension>`) under a single configured root
//!   directory. Callers never choose the on-disk name.
//! - Reads go through [`ReportStore::open`], which refuses any key that would
//!   resolve outside the configured root (path-traversal guard).
//! - Files are write-once: the store never overwrites or mutates an existing
//!   object.

mod store;

pub use store::{ReportStore, StoredFile};

/// Errors that can occur during report file operations
#[derive(Debug, thiserror::Error)]
pub enum FilesError {
    /// Root directory does not exist or is not a directory
    #[error("invalid reports root directory: {0}")]
    InvalidRootDirectory(String),

    /// Requested object key failed validation (potential directory traversal)
    #[error("invalid object key: {0}")]
    InvalidKey(String),

    /// No stored file for the requested object key
    #[error("file not found for key: {0}")]
    NotFound(String),

    /// I/O error occurred
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type FilesResult<T> = std::result::Result<T, FilesError>;
