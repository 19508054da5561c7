//! Authentication endpoints for AppUsers and staff.
//!
//! Staff accounts live in the same `app_user` table with role `staff`, so
//! the staff login is password login plus a role check; both paths hand out
//! the same kind of bearer token.

use crate::dto::{AuthRes, OtpLoginReq, PasswordLoginReq, SignupVerifyReq, StaffLoginReq};
use crate::error::{ApiError, ApiResult};
use crate::extract::Caller;
use crate::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use healthvault_core::entities::AppUser;
use healthvault_core::services::auth;
use healthvault_core::Identity;

#[utoipa::path(
    post,
    path = "/api/app/auth/signup-verify",
    request_body = SignupVerifyReq,
    responses(
        (status = 201, description = "Account verified, token issued", body = AuthRes),
        (status = 400, description = "Invalid or expired code")
    )
)]
/// Completes OTP signup, creating the account on first contact.
#[axum::debug_handler]
pub async fn signup_verify(
    State(state): State<AppState>,
    Json(req): Json<SignupVerifyReq>,
) -> ApiResult<(StatusCode, Json<AuthRes>)> {
    let session = auth::signup_verify(
        &state.pool,
        &state.cfg,
        &req.destination,
        &req.code,
        req.username.as_deref(),
        req.password.as_deref(),
    )
    .await?;
    Ok((
        StatusCode::CREATED,
        Json(AuthRes { token: session.token, app_user: session.user }),
    ))
}

#[utoipa::path(
    post,
    path = "/api/app/auth/login",
    request_body = OtpLoginReq,
    responses(
        (status = 200, description = "Token issued", body = AuthRes),
        (status = 400, description = "Invalid or expired code"),
        (status = 404, description = "No account for this destination")
    )
)]
/// OTP login for an existing account.
#[axum::debug_handler]
pub async fn login_otp(
    State(state): State<AppState>,
    Json(req): Json<OtpLoginReq>,
) -> ApiResult<Json<AuthRes>> {
    let session = auth::login_with_otp(&state.pool, &state.cfg, &req.destination, &req.code).await?;
    Ok(Json(AuthRes { token: session.token, app_user: session.user }))
}

#[utoipa::path(
    post,
    path = "/api/app/auth/login-password",
    request_body = PasswordLoginReq,
    responses(
        (status = 200, description = "Token issued", body = AuthRes),
        (status = 401, description = "Invalid credentials")
    )
)]
#[axum::debug_handler]
pub async fn login_password(
    State(state): State<AppState>,
    Json(req): Json<PasswordLoginReq>,
) -> ApiResult<Json<AuthRes>> {
    let session =
        auth::login_with_password(&state.pool, &state.cfg, &req.destination, &req.password).await?;
    Ok(Json(AuthRes { token: session.token, app_user: session.user }))
}

#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = StaffLoginReq,
    responses(
        (status = 200, description = "Token issued", body = AuthRes),
        (status = 401, description = "Invalid credentials or not a staff account")
    )
)]
/// Staff password login. Rejects accounts without the staff role.
#[axum::debug_handler]
pub async fn staff_login(
    State(state): State<AppState>,
    Json(req): Json<StaffLoginReq>,
) -> ApiResult<Json<AuthRes>> {
    let session =
        auth::login_with_password(&state.pool, &state.cfg, &req.username, &req.password).await?;
    if !session.user.is_staff() {
        return Err(ApiError::new(StatusCode::UNAUTHORIZED, "Invalid credentials."));
    }
    Ok(Json(AuthRes { token: session.token, app_user: session.user }))
}

#[utoipa::path(
    get,
    path = "/api/app/auth/me",
    responses(
        (status = 200, description = "The caller's profile", body = AppUser),
        (status = 401, description = "No valid token")
    ),
    security(("bearer" = []))
)]
/// The authenticated caller's own profile.
#[axum::debug_handler(state = AppState)]
pub async fn me(Caller(identity): Caller) -> ApiResult<Json<AppUser>> {
    match identity {
        Identity::Staff(user) | Identity::AppUser(user) => Ok(Json(user)),
        Identity::Anonymous => Err(ApiError::new(
            StatusCode::UNAUTHORIZED,
            "Authentication required.",
        )),
    }
}

#[utoipa::path(
    get,
    path = "/api/auth/me",
    responses(
        (status = 200, description = "The staff caller's profile", body = AppUser),
        (status = 401, description = "No valid token"),
        (status = 403, description = "Not a staff account")
    ),
    security(("bearer" = []))
)]
#[axum::debug_handler(state = AppState)]
pub async fn staff_me(Caller(identity): Caller) -> ApiResult<Json<AppUser>> {
    match identity {
        Identity::Staff(user) => Ok(Json(user)),
        Identity::AppUser(_) => Err(ApiError::new(StatusCode::FORBIDDEN, "Staff access required.")),
        Identity::Anonymous => Err(ApiError::new(
            StatusCode::UNAUTHORIZED,
            "Authentication required.",
        )),
    }
}
