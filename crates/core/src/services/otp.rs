//! One-time code issuance and verification.
//!
//! Codes are six decimal digits (leading zeros kept), hashed with a per-row
//! salt before storage, and expire after the configured TTL. A destination
//! may hold several outstanding codes; verification checks the newest
//! unexpired, unconsumed row only, so an old code cannot resurrect after a
//! newer one was sent.

use crate::entities::OtpCode;
use crate::{hashing, CoreConfig, CoreError, CoreResult};
use chrono::{Duration, Utc};
use rand::Rng;
use sqlx::SqlitePool;
use tracing::{debug, info};

/// Outcome of issuing a code.
#[derive(Debug, Clone)]
pub struct IssuedOtp {
    /// Where the code was (notionally) delivered, masked for echoing back
    pub masked_destination: String,
    /// Raw code, present only when debug echo is switched on
    pub debug_code: Option<String>,
}

/// Issues a fresh code for `destination` and `purpose`.
///
/// Delivery is out of scope here; deployments hook an SMS/email gateway onto
/// the issuance log. With `otp_debug_echo` enabled the raw code is returned
/// for local testing.
pub async fn issue(
    pool: &SqlitePool,
    cfg: &CoreConfig,
    destination: &str,
    purpose: &str,
) -> CoreResult<IssuedOtp> {
    let destination = destination.trim();
    if destination.is_empty() {
        return Err(CoreError::InvalidInput("Destination is required.".into()));
    }
    let purpose = if purpose.trim().is_empty() { "login" } else { purpose.trim() };

    let code = generate_code();
    let salt = hashing::generate_salt();
    let code_hash = hashing::hash_secret(&salt, &code);
    let expires_at = Utc::now() + Duration::seconds(cfg.otp_ttl_secs());

    sqlx::query(
        "INSERT INTO otp_code (destination, purpose, code_hash, salt, expires_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
    )
    .bind(destination)
    .bind(purpose)
    .bind(&code_hash)
    .bind(&salt)
    .bind(expires_at)
    .execute(pool)
    .await?;

    let masked = mask_destination(destination);
    info!(destination = %masked, purpose, "one-time code issued");

    Ok(IssuedOtp {
        masked_destination: masked,
        debug_code: cfg.otp_debug_echo().then(|| code),
    })
}

/// Verifies `code` against the newest outstanding row for `destination`
/// whose purpose is in `purposes`, and consumes it.
///
/// # Errors
///
/// [`CoreError::ExpiredCode`] when no outstanding row exists,
/// [`CoreError::InvalidCode`] when the supplied code does not match it.
pub async fn verify_and_consume(
    pool: &SqlitePool,
    destination: &str,
    purposes: &[&str],
    code: &str,
) -> CoreResult<()> {
    let row = newest_outstanding(pool, destination, purposes).await?;
    let Some(row) = row else {
        return Err(CoreError::ExpiredCode);
    };

    if !hashing::verify_secret(&row.salt, code, &row.code_hash) {
        debug!(otp_id = row.id, "one-time code mismatch");
        return Err(CoreError::InvalidCode);
    }

    sqlx::query("UPDATE otp_code SET consumed_at = ?1 WHERE id = ?2 AND consumed_at IS NULL")
        .bind(Utc::now())
        .bind(row.id)
        .execute(pool)
        .await?;
    Ok(())
}

async fn newest_outstanding(
    pool: &SqlitePool,
    destination: &str,
    purposes: &[&str],
) -> CoreResult<Option<OtpCode>> {
    // Purposes are a short fixed list from the auth flows, never caller
    // input, so building the placeholder list inline is fine.
    let placeholders = (0..purposes.len())
        .map(|i| format!("?{}", i + 3))
        .collect::<Vec<_>>()
        .join(", ");
    let sql = format!(
        "SELECT * FROM otp_code
         WHERE destination = ?1 AND consumed_at IS NULL AND expires_at > ?2
           AND purpose IN ({placeholders})
         ORDER BY id DESC LIMIT 1"
    );
    let mut query = sqlx::query_as::<_, OtpCode>(&sql)
        .bind(destination.trim())
        .bind(Utc::now());
    for purpose in purposes {
        query = query.bind(*purpose);
    }
    let row = query.fetch_optional(pool).await?;
    Ok(row)
}

fn generate_code() -> String {
    format!("{:06}", rand::thread_rng().gen_range(0..1_000_000))
}

/// Masks a delivery destination for echoing back to the caller.
///
/// Emails keep the first character of the local part and the full domain;
/// phone numbers keep the last four digits.
#[must_use]
pub fn mask_destination(destination: &str) -> String {
    match destination.split_once('@') {
        Some((local, domain)) => {
            let head = local.chars().next().map(String::from).unwrap_or_default();
            format!("{head}***@{domain}")
        }
        None => {
            let tail: String = destination
                .chars()
                .rev()
                .take(4)
                .collect::<Vec<_>>()
                .into_iter()
                .rev()
                .collect();
            format!("***{tail}")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::test_pool;
    use std::path::PathBuf;

    fn cfg(echo: bool) -> CoreConfig {
        CoreConfig::new(
            "sqlite::memory:".into(),
            PathBuf::from("/tmp"),
            "secret".into(),
            30,
            300,
            echo,
        )
        .unwrap()
    }

    #[test]
    fn masking_covers_email_and_phone_shapes() {
        assert_eq!(mask_destination("parent@example.com"), "p***@example.com");
        assert_eq!(mask_destination("+15551234567"), "***4567");
        assert_eq!(mask_destination("123"), "***123");
    }

    #[tokio::test]
    async fn issued_code_verifies_once_then_is_consumed() {
        let pool = test_pool().await;
        let issued = issue(&pool, &cfg(true), "parent@example.com", "login")
            .await
            .unwrap();
        let code = issued.debug_code.expect("debug echo enabled");
        assert_eq!(code.len(), 6);
        assert_eq!(issued.masked_destination, "p***@example.com");

        verify_and_consume(&pool, "parent@example.com", &["login"], &code)
            .await
            .unwrap();

        // The row was consumed, so retrying finds nothing outstanding.
        let retry = verify_and_consume(&pool, "parent@example.com", &["login"], &code).await;
        assert!(matches!(retry, Err(CoreError::ExpiredCode)));
    }

    #[tokio::test]
    async fn wrong_code_is_invalid_and_leaves_the_row_outstanding() {
        let pool = test_pool().await;
        let issued = issue(&pool, &cfg(true), "parent@example.com", "login")
            .await
            .unwrap();
        let code = issued.debug_code.unwrap();
        let wrong = if code == "000000" { "000001" } else { "000000" };

        let miss = verify_and_consume(&pool, "parent@example.com", &["login"], wrong).await;
        assert!(matches!(miss, Err(CoreError::InvalidCode)));

        verify_and_consume(&pool, "parent@example.com", &["login"], &code)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn only_the_newest_outstanding_code_counts() {
        let pool = test_pool().await;
        let first = issue(&pool, &cfg(true), "parent@example.com", "login")
            .await
            .unwrap()
            .debug_code
            .unwrap();
        let second = issue(&pool, &cfg(true), "parent@example.com", "login")
            .await
            .unwrap()
            .debug_code
            .unwrap();

        if first != second {
            let stale = verify_and_consume(&pool, "parent@example.com", &["login"], &first).await;
            assert!(matches!(stale, Err(CoreError::InvalidCode)));
        }
        verify_and_consume(&pool, "parent@example.com", &["login"], &second)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn purposes_are_checked() {
        let pool = test_pool().await;
        let code = issue(&pool, &cfg(true), "parent@example.com", "signup")
            .await
            .unwrap()
            .debug_code
            .unwrap();

        let wrong_purpose =
            verify_and_consume(&pool, "parent@example.com", &["reset"], &code).await;
        assert!(matches!(wrong_purpose, Err(CoreError::ExpiredCode)));

        // Auth flows accept signup and login codes interchangeably.
        verify_and_consume(&pool, "parent@example.com", &["signup", "login"], &code)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn expired_code_does_not_verify() {
        let pool = test_pool().await;
        let salt = crate::hashing::generate_salt();
        sqlx::query(
            "INSERT INTO otp_code (destination, purpose, code_hash, salt, expires_at)
             VALUES ('parent@example.com', 'login', ?1, ?2, ?3)",
        )
        .bind(crate::hashing::hash_secret(&salt, "123456"))
        .bind(&salt)
        .bind(Utc::now() - Duration::seconds(1))
        .execute(&pool)
        .await
        .unwrap();

        let result =
            verify_and_consume(&pool, "parent@example.com", &["login"], "123456").await;
        assert!(matches!(result, Err(CoreError::ExpiredCode)));
    }

    #[tokio::test]
    async fn blank_destination_rejected() {
        let pool = test_pool().await;
        let result = issue(&pool, &cfg(false), "   ", "login").await;
        assert!(matches!(result, Err(CoreError::InvalidInput(_))));
    }
}
