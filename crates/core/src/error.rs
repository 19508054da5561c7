//! Error taxonomy for the core services.
//!
//! Every service returns [`CoreError`]; the REST layer maps variants onto
//! status codes. Storage constraint violations are translated here (unique
//! violations become [`CoreError::Conflict`]) so raw driver errors never reach
//! a caller.

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// Malformed or missing input the caller can correct (400)
    #[error("{0}")]
    InvalidInput(String),

    /// Referenced entity absent or inactive (404)
    #[error("{0}")]
    NotFound(String),

    /// No identity on a path that requires one (401)
    #[error("{0}")]
    Unauthorized(String),

    /// Identity resolved but lacks rights (403)
    #[error("{0}")]
    Forbidden(String),

    /// Uniqueness or referential violation surfaced from storage (409)
    #[error("{0}")]
    Conflict(String),

    /// No valid one-time code on record for the destination (400)
    #[error("OTP expired or not found.")]
    ExpiredCode,

    /// Supplied one-time code does not match the stored hash (400)
    #[error("Invalid code.")]
    InvalidCode,

    /// Unexpected storage fault (500, logged, detail not exposed)
    #[error("database error: {0}")]
    Database(sqlx::Error),

    /// Unexpected infrastructure fault (500)
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<sqlx::Error> for CoreError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => CoreError::NotFound("record not found".into()),
            sqlx::Error::Database(db) => {
                // SQLite reports "UNIQUE constraint failed: ...", Postgres
                // "duplicate key value violates unique constraint ...".
                let msg = db.message();
                if msg.contains("UNIQUE") || msg.contains("unique") {
                    CoreError::Conflict("duplicate record violates a uniqueness constraint".into())
                } else if msg.contains("FOREIGN KEY") || msg.contains("foreign key") {
                    CoreError::InvalidInput("referenced record does not exist".into())
                } else {
                    CoreError::Database(err)
                }
            }
            _ => CoreError::Database(err),
        }
    }
}

impl From<jsonwebtoken::errors::Error> for CoreError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        // Only token *issuance* propagates errors; failed verification is
        // treated as an absent identity, never as an error.
        CoreError::Internal(format!("failed to sign token: {err}"))
    }
}

pub type CoreResult<T> = std::result::Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_not_found_maps_to_not_found() {
        let err: CoreError = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, CoreError::NotFound(_)));
    }

    #[test]
    fn otp_errors_render_caller_facing_detail() {
        assert_eq!(CoreError::ExpiredCode.to_string(), "OTP expired or not found.");
        assert_eq!(CoreError::InvalidCode.to_string(), "Invalid code.");
    }
}
