//! Request identity resolution.
//!
//! Every request resolves to exactly one [`Identity`] at the boundary and the
//! resolved value is passed explicitly into the services — no handler
//! re-derives the caller ad hoc. Two things feed the resolution:
//!
//! - a bearer token (HS256, subject marker `app_user`) referencing an
//!   `app_user` row, and
//! - that row's role: `staff` yields [`Identity::Staff`] with full
//!   visibility, anything else yields [`Identity::AppUser`] scoped by access
//!   grants.
//!
//! An invalid token is treated as **absent** — wrong signature, wrong subject
//! marker, expiry, or a missing/inactive account all resolve to
//! [`Identity::Anonymous`], never to an error. Listing endpoints then return
//! nothing (fail closed) while mutating endpoints reject with `Unauthorized`.

use crate::entities::AppUser;
use crate::{CoreConfig, CoreResult};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

/// Subject marker carried by every token this system issues.
pub const TOKEN_SUBJECT: &str = "app_user";

/// Claims carried by an issued bearer token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    pub sub: String,
    pub app_user_id: i64,
    pub iat: i64,
    pub exp: i64,
}

/// The resolved caller of a request.
#[derive(Debug, Clone)]
pub enum Identity {
    /// Staff account: full visibility, no patient-set restriction
    Staff(AppUser),
    /// Mobile/guardian account: visibility restricted to granted patients
    AppUser(AppUser),
    /// No valid credential on the request
    Anonymous,
}

impl Identity {
    #[must_use]
    pub fn is_staff(&self) -> bool {
        matches!(self, Identity::Staff(_))
    }

    /// The underlying account, when there is one.
    #[must_use]
    pub fn account(&self) -> Option<&AppUser> {
        match self {
            Identity::Staff(user) | Identity::AppUser(user) => Some(user),
            Identity::Anonymous => None,
        }
    }
}

/// Issues a bearer token for an AppUser id, valid for `days_valid` days.
pub fn issue_token(cfg: &CoreConfig, app_user_id: i64, days_valid: i64) -> CoreResult<String> {
    let now = Utc::now();
    let claims = TokenClaims {
        sub: TOKEN_SUBJECT.to_string(),
        app_user_id,
        iat: now.timestamp(),
        exp: (now + Duration::days(days_valid)).timestamp(),
    };
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(cfg.jwt_secret().as_bytes()),
    )?;
    Ok(token)
}

/// Decodes a bearer token, returning `None` on any failure.
///
/// Expired signatures, bad keys, and a wrong subject marker all yield `None`;
/// the caller treats that as "no credential supplied".
pub fn decode_token(cfg: &CoreConfig, token: &str) -> Option<TokenClaims> {
    let decoded = decode::<TokenClaims>(
        token,
        &DecodingKey::from_secret(cfg.jwt_secret().as_bytes()),
        &Validation::default(),
    )
    .ok()?;

    if decoded.claims.sub != TOKEN_SUBJECT {
        return None;
    }
    Some(decoded.claims)
}

/// Resolves an `Authorization` header value to an [`Identity`].
///
/// # Errors
///
/// Only storage faults propagate; every credential problem resolves to
/// `Identity::Anonymous`.
pub async fn resolve_bearer(
    pool: &SqlitePool,
    cfg: &CoreConfig,
    authorization: Option<&str>,
) -> CoreResult<Identity> {
    let Some(header) = authorization else {
        return Ok(Identity::Anonymous);
    };
    let Some(token) = header.strip_prefix("Bearer ") else {
        return Ok(Identity::Anonymous);
    };
    let Some(claims) = decode_token(cfg, token.trim()) else {
        return Ok(Identity::Anonymous);
    };

    let user = sqlx::query_as::<_, AppUser>(
        "SELECT * FROM app_user WHERE id = ?1 AND is_active = 1",
    )
    .bind(claims.app_user_id)
    .fetch_optional(pool)
    .await?;

    Ok(match user {
        Some(user) if user.is_staff() => Identity::Staff(user),
        Some(user) => Identity::AppUser(user),
        None => Identity::Anonymous,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::test_pool;
    use std::path::PathBuf;

    fn cfg() -> CoreConfig {
        CoreConfig::new(
            "sqlite::memory:".into(),
            PathBuf::from("/tmp"),
            "test-secret".into(),
            30,
            300,
            false,
        )
        .expect("config")
    }

    async fn insert_user(pool: &SqlitePool, email: &str, role: &str, active: bool) -> i64 {
        sqlx::query(
            "INSERT INTO app_user (email, username, role, is_active, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )
        .bind(email)
        .bind(email.split('@').next().unwrap())
        .bind(role)
        .bind(active)
        .bind(Utc::now())
        .execute(pool)
        .await
        .expect("insert app_user")
        .last_insert_rowid()
    }

    #[test]
    fn issued_tokens_decode_with_the_right_subject() {
        let cfg = cfg();
        let token = issue_token(&cfg, 42, 30).expect("token");
        let claims = decode_token(&cfg, &token).expect("claims");
        assert_eq!(claims.sub, TOKEN_SUBJECT);
        assert_eq!(claims.app_user_id, 42);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn tokens_signed_with_another_key_are_rejected() {
        let cfg = cfg();
        let other = CoreConfig::new(
            "sqlite::memory:".into(),
            PathBuf::from("/tmp"),
            "different-secret".into(),
            30,
            300,
            false,
        )
        .unwrap();

        let token = issue_token(&other, 42, 30).expect("token");
        assert!(decode_token(&cfg, &token).is_none());
    }

    #[tokio::test]
    async fn bearer_resolves_staff_and_app_user_variants() {
        let pool = test_pool().await;
        let cfg = cfg();

        let staff_id = insert_user(&pool, "nurse@hospital.test", "staff", true).await;
        let guardian_id = insert_user(&pool, "parent@example.test", "guardian", true).await;

        let staff_token = issue_token(&cfg, staff_id, 30).unwrap();
        let header = format!("Bearer {staff_token}");
        let identity = resolve_bearer(&pool, &cfg, Some(&header)).await.unwrap();
        assert!(identity.is_staff());

        let guardian_token = issue_token(&cfg, guardian_id, 30).unwrap();
        let header = format!("Bearer {guardian_token}");
        let identity = resolve_bearer(&pool, &cfg, Some(&header)).await.unwrap();
        assert!(matches!(identity, Identity::AppUser(_)));
        assert_eq!(identity.account().unwrap().id, guardian_id);
    }

    #[tokio::test]
    async fn inactive_account_and_garbage_tokens_resolve_anonymous() {
        let pool = test_pool().await;
        let cfg = cfg();

        let inactive_id = insert_user(&pool, "gone@example.test", "patient", false).await;
        let token = issue_token(&cfg, inactive_id, 30).unwrap();
        let header = format!("Bearer {token}");
        let identity = resolve_bearer(&pool, &cfg, Some(&header)).await.unwrap();
        assert!(matches!(identity, Identity::Anonymous));

        for header in [None, Some("Bearer not-a-jwt"), Some("Basic abc")] {
            let identity = resolve_bearer(&pool, &cfg, header).await.unwrap();
            assert!(matches!(identity, Identity::Anonymous));
        }
    }
}
