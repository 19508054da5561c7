//! AppUser authentication flows.
//!
//! Three ways in: OTP signup (creates or reuses the account for the
//! destination), OTP login (account must already exist), and password login
//! for accounts that set one. All three end in the same place, a signed
//! bearer token for the account.
//!
//! Signup and login codes are accepted interchangeably during verification.
//! A user who taps "sign up" with an existing account, or "log in" right
//! after receiving a signup code, should not be bounced over a label.

use crate::entities::AppUser;
use crate::services::otp;
use crate::{hashing, identity, CoreConfig, CoreError, CoreResult};
use chrono::Utc;
use sqlx::SqlitePool;
use tracing::info;

const AUTH_PURPOSES: &[&str] = &["signup", "login"];

/// A successful authentication: the token plus the account it names.
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub token: String,
    pub user: AppUser,
}

/// Verifies a signup code and returns a session, creating the account on
/// first contact with this destination.
pub async fn signup_verify(
    pool: &SqlitePool,
    cfg: &CoreConfig,
    destination: &str,
    code: &str,
    username: Option<&str>,
    password: Option<&str>,
) -> CoreResult<AuthSession> {
    let destination = destination.trim();
    otp::verify_and_consume(pool, destination, AUTH_PURPOSES, code).await?;

    let user = match find_by_destination(pool, destination).await? {
        Some(existing) => existing,
        None => create_account(pool, destination, username, password).await?,
    };
    session_for(cfg, user)
}

/// Verifies a login code for an existing account and returns a session.
pub async fn login_with_otp(
    pool: &SqlitePool,
    cfg: &CoreConfig,
    destination: &str,
    code: &str,
) -> CoreResult<AuthSession> {
    let destination = destination.trim();
    otp::verify_and_consume(pool, destination, AUTH_PURPOSES, code).await?;

    let user = find_by_destination(pool, destination)
        .await?
        .ok_or_else(|| CoreError::NotFound("No account for this destination.".into()))?;
    session_for(cfg, user)
}

/// Password login by username or email.
///
/// Unknown account, account without a password, and wrong password all
/// collapse into the same `Unauthorized` so the response does not confirm
/// which accounts exist.
pub async fn login_with_password(
    pool: &SqlitePool,
    cfg: &CoreConfig,
    username_or_email: &str,
    password: &str,
) -> CoreResult<AuthSession> {
    let handle = username_or_email.trim();
    let user = sqlx::query_as::<_, AppUser>(
        "SELECT * FROM app_user
         WHERE (username = ?1 OR email = ?1) AND is_active = 1
         LIMIT 1",
    )
    .bind(handle)
    .fetch_optional(pool)
    .await?;

    let valid = user
        .as_ref()
        .and_then(|u| u.password_hash.as_deref())
        .is_some_and(|stored| hashing::check_password(password, stored));
    match (user, valid) {
        (Some(user), true) => session_for(cfg, user),
        _ => Err(CoreError::Unauthorized("Invalid credentials.".into())),
    }
}

async fn create_account(
    pool: &SqlitePool,
    destination: &str,
    username: Option<&str>,
    password: Option<&str>,
) -> CoreResult<AppUser> {
    let (email, phone) = if destination.contains('@') {
        (Some(destination), None)
    } else {
        (None, Some(destination))
    };
    let password_hash = password
        .filter(|p| !p.trim().is_empty())
        .map(hashing::make_password);

    let id = sqlx::query(
        "INSERT INTO app_user (email, phone, username, password_hash, role, is_active, created_at)
         VALUES (?1, ?2, ?3, ?4, 'guardian', 1, ?5)",
    )
    .bind(email)
    .bind(phone)
    .bind(username.map(str::trim).filter(|u| !u.is_empty()))
    .bind(password_hash)
    .bind(Utc::now())
    .execute(pool)
    .await?
    .last_insert_rowid();

    info!(app_user_id = id, "app user account created");
    let user = sqlx::query_as::<_, AppUser>("SELECT * FROM app_user WHERE id = ?1")
        .bind(id)
        .fetch_one(pool)
        .await?;
    Ok(user)
}

async fn find_by_destination(pool: &SqlitePool, destination: &str) -> CoreResult<Option<AppUser>> {
    let user = sqlx::query_as::<_, AppUser>(
        "SELECT * FROM app_user
         WHERE (email = ?1 OR phone = ?1) AND is_active = 1
         LIMIT 1",
    )
    .bind(destination)
    .fetch_optional(pool)
    .await?;
    Ok(user)
}

fn session_for(cfg: &CoreConfig, user: AppUser) -> CoreResult<AuthSession> {
    let token = identity::issue_token(cfg, user.id, cfg.token_ttl_days())?;
    Ok(AuthSession { token, user })
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
            "secret".into(),
            30,
            300,
            true,
        )
        .unwrap()
    }

    async fn issue_code(pool: &SqlitePool, destination: &str, purpose: &str) -> String {
        otp::issue(pool, &cfg(), destination, purpose)
            .await
            .unwrap()
            .debug_code
            .unwrap()
    }

    #[tokio::test]
    async fn signup_creates_account_and_issues_usable_token() {
        let pool = test_pool().await;
        let code = issue_code(&pool, "parent@example.com", "signup").await;

        let session = signup_verify(
            &pool,
            &cfg(),
            "parent@example.com",
            &code,
            Some("parent1"),
            Some("hunter2"),
        )
        .await
        .unwrap();

        assert_eq!(session.user.email.as_deref(), Some("parent@example.com"));
        assert_eq!(session.user.username.as_deref(), Some("parent1"));
        let claims = identity::decode_token(&cfg(), &session.token).expect("valid token");
        assert_eq!(claims.app_user_id, session.user.id);
    }

    #[tokio::test]
    async fn signup_with_existing_destination_reuses_the_account() {
        let pool = test_pool().await;
        let code = issue_code(&pool, "parent@example.com", "signup").await;
        let first = signup_verify(&pool, &cfg(), "parent@example.com", &code, None, None)
            .await
            .unwrap();

        let code = issue_code(&pool, "parent@example.com", "signup").await;
        let second = signup_verify(&pool, &cfg(), "parent@example.com", &code, None, None)
            .await
            .unwrap();
        assert_eq!(first.user.id, second.user.id);
    }

    #[tokio::test]
    async fn phone_signup_sets_phone_not_email() {
        let pool = test_pool().await;
        let code = issue_code(&pool, "+15551234567", "signup").await;
        let session = signup_verify(&pool, &cfg(), "+15551234567", &code, None, None)
            .await
            .unwrap();
        assert_eq!(session.user.phone.as_deref(), Some("+15551234567"));
        assert!(session.user.email.is_none());
    }

    #[tokio::test]
    async fn otp_login_requires_an_existing_account() {
        let pool = test_pool().await;
        let code = issue_code(&pool, "stranger@example.com", "login").await;
        let result = login_with_otp(&pool, &cfg(), "stranger@example.com", &code).await;
        assert!(matches!(result, Err(CoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn login_accepts_a_signup_purpose_code() {
        let pool = test_pool().await;
        let code = issue_code(&pool, "parent@example.com", "signup").await;
        signup_verify(&pool, &cfg(), "parent@example.com", &code, None, None)
            .await
            .unwrap();

        let code = issue_code(&pool, "parent@example.com", "signup").await;
        let session = login_with_otp(&pool, &cfg(), "parent@example.com", &code)
            .await
            .unwrap();
        assert_eq!(session.user.email.as_deref(), Some("parent@example.com"));
    }

    #[tokio::test]
    async fn password_login_round_trips_and_rejects_bad_credentials() {
        let pool = test_pool().await;
        let code = issue_code(&pool, "parent@example.com", "signup").await;
        signup_verify(
            &pool,
            &cfg(),
            "parent@example.com",
            &code,
            Some("parent1"),
            Some("hunter2"),
        )
        .await
        .unwrap();

        let by_username = login_with_password(&pool, &cfg(), "parent1", "hunter2")
            .await
            .unwrap();
        let by_email = login_with_password(&pool, &cfg(), "parent@example.com", "hunter2")
            .await
            .unwrap();
        assert_eq!(by_username.user.id, by_email.user.id);

        let wrong = login_with_password(&pool, &cfg(), "parent1", "hunter3").await;
        assert!(matches!(wrong, Err(CoreError::Unauthorized(_))));
        let unknown = login_with_password(&pool, &cfg(), "nobody", "hunter2").await;
        assert!(matches!(unknown, Err(CoreError::Unauthorized(_))));
    }
}
