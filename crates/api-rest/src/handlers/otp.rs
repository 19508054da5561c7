//! One-time code endpoints.

use crate::dto::{OtpSendReq, OtpSendRes, OtpVerifyReq, OtpVerifyRes};
use crate::error::ApiResult;
use crate::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use healthvault_core::services::otp;

#[utoipa::path(
    post,
    path = "/api/otp/send",
    request_body = OtpSendReq,
    responses(
        (status = 201, description = "Code issued", body = OtpSendRes),
        (status = 400, description = "Missing destination")
    )
)]
/// Issues a one-time code for a destination.
///
/// The raw code is only echoed back when debug echo is enabled in the
/// server configuration.
#[axum::debug_handler]
pub async fn send(
    State(state): State<AppState>,
    Json(req): Json<OtpSendReq>,
) -> ApiResult<(StatusCode, Json<OtpSendRes>)> {
    let purpose = req.purpose.as_deref().unwrap_or("login");
    let issued = otp::issue(&state.pool, &state.cfg, &req.destination, purpose).await?;
    Ok((
        StatusCode::CREATED,
        Json(OtpSendRes {
            ok: true,
            destination: issued.masked_destination,
            expires_in: state.cfg.otp_ttl_secs(),
            debug_code: issued.debug_code,
        }),
    ))
}

#[utoipa::path(
    post,
    path = "/api/otp/verify",
    request_body = OtpVerifyReq,
    responses(
        (status = 200, description = "Code accepted", body = OtpVerifyRes),
        (status = 400, description = "Invalid or expired code")
    )
)]
/// Verifies and consumes a one-time code.
///
/// Signup and login codes are interchangeable; any other purpose must match
/// exactly.
#[axum::debug_handler]
pub async fn verify(
    State(state): State<AppState>,
    Json(req): Json<OtpVerifyReq>,
) -> ApiResult<Json<OtpVerifyRes>> {
    let purpose = req.purpose.as_deref().unwrap_or("login").to_string();
    let purposes: Vec<&str> = if matches!(purpose.as_str(), "signup" | "login") {
        vec!["signup", "login"]
    } else {
        vec![purpose.as_str()]
    };
    otp::verify_and_consume(&state.pool, &req.destination, &purposes, &req.code).await?;
    Ok(Json(OtpVerifyRes {
        valid: true,
        destination: otp::mask_destination(req.destination.trim()),
        purpose,
    }))
}
