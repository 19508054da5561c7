//! Core runtime configuration.
//!
//! Configuration is resolved once at process startup and passed into services
//! behind an `Arc`. Request handlers never read environment variables; that
//! keeps behaviour consistent across worker threads and test harnesses.

use crate::{CoreError, CoreResult};
use std::path::{Path, PathBuf};

const DEFAULT_DATABASE_URL: &str = "sqlite://healthvault.db";
const DEFAULT_REPORTS_DIR: &str = "reports";
const DEFAULT_TOKEN_TTL_DAYS: i64 = 30;
const DEFAULT_OTP_TTL_SECS: i64 = 300;

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    database_url: String,
    reports_dir: PathBuf,
    jwt_secret: String,
    token_ttl_days: i64,
    otp_ttl_secs: i64,
    otp_debug_echo: bool,
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidInput` if the JWT secret is empty or a TTL
    /// is not positive.
    pub fn new(
        database_url: String,
        reports_dir: PathBuf,
        jwt_secret: String,
        token_ttl_days: i64,
        otp_ttl_secs: i64,
        otp_debug_echo: bool,
    ) -> CoreResult<Self> {
        if jwt_secret.trim().is_empty() {
            return Err(CoreError::InvalidInput("jwt secret cannot be empty".into()));
        }
        if token_ttl_days <= 0 {
            return Err(CoreError::InvalidInput(
                "token_ttl_days must be positive".into(),
            ));
        }
        if otp_ttl_secs <= 0 {
            return Err(CoreError::InvalidInput(
                "otp_ttl_secs must be positive".into(),
            ));
        }

        Ok(Self {
            database_url,
            reports_dir,
            jwt_secret,
            token_ttl_days,
            otp_ttl_secs,
            otp_debug_echo,
        })
    }

    /// Build configuration from `HEALTHVAULT_*` environment variables.
    ///
    /// `HEALTHVAULT_JWT_SECRET` is required; everything else has a default:
    /// `HEALTHVAULT_DATABASE_URL`, `HEALTHVAULT_REPORTS_DIR`,
    /// `HEALTHVAULT_TOKEN_TTL_DAYS`, `HEALTHVAULT_OTP_TTL_SECS`,
    /// `HEALTHVAULT_OTP_DEBUG_ECHO` (`1`/`true` enables echoing raw codes in
    /// OTP responses — development only).
    pub fn from_env() -> CoreResult<Self> {
        let database_url = std::env::var("HEALTHVAULT_DATABASE_URL")
            .unwrap_or_else(|_| DEFAULT_DATABASE_URL.into());
        let reports_dir = std::env::var("HEALTHVAULT_REPORTS_DIR")
            .unwrap_or_else(|_| DEFAULT_REPORTS_DIR.into());
        let jwt_secret = std::env::var("HEALTHVAULT_JWT_SECRET").map_err(|_| {
            CoreError::InvalidInput("HEALTHVAULT_JWT_SECRET must be set".into())
        })?;

        let token_ttl_days = parse_env_i64("HEALTHVAULT_TOKEN_TTL_DAYS", DEFAULT_TOKEN_TTL_DAYS)?;
        let otp_ttl_secs = parse_env_i64("HEALTHVAULT_OTP_TTL_SECS", DEFAULT_OTP_TTL_SECS)?;
        let otp_debug_echo = matches!(
            std::env::var("HEALTHVAULT_OTP_DEBUG_ECHO").as_deref(),
            Ok("1") | Ok("true") | Ok("True")
        );

        Self::new(
            database_url,
            PathBuf::from(reports_dir),
            jwt_secret,
            token_ttl_days,
            otp_ttl_secs,
            otp_debug_echo,
        )
    }

    pub fn database_url(&self) -> &str {
        &self.database_url
    }

    pub fn reports_dir(&self) -> &Path {
        &self.reports_dir
    }

    pub fn jwt_secret(&self) -> &str {
        &self.jwt_secret
    }

    pub fn token_ttl_days(&self) -> i64 {
        self.token_ttl_days
    }

    pub fn otp_ttl_secs(&self) -> i64 {
        self.otp_ttl_secs
    }

    pub fn otp_debug_echo(&self) -> bool {
        self.otp_debug_echo
    }
}

fn parse_env_i64(var: &str, default: i64) -> CoreResult<i64> {
    match std::env::var(var) {
        Ok(raw) => raw
            .trim()
            .parse::<i64>()
            .map_err(|_| CoreError::InvalidInput(format!("{var} must be an integer"))),
        Err(_) => Ok(default),
    }
}
