//! Patient-access grant endpoints.

use crate::dto::GrantReq;
use crate::error::ApiResult;
use crate::extract::Caller;
use crate::AppState;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use healthvault_core::entities::PatientAccess;
use healthvault_core::services::access;
use serde::Deserialize;
use utoipa::IntoParams;

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(deny_unknown_fields)]
pub struct GrantListQuery {
    /// Staff may inspect another user's grants
    pub user_id: Option<i64>,
}

#[utoipa::path(
    get,
    path = "/api/patient-access",
    params(GrantListQuery),
    responses(
        (status = 200, description = "Grants for the caller (or the queried user, for staff)", body = [PatientAccess]),
        (status = 401, description = "Authentication required")
    ),
    security(("bearer" = []))
)]
#[axum::debug_handler]
pub async fn list(
    State(state): State<AppState>,
    Caller(identity): Caller,
    Query(query): Query<GrantListQuery>,
) -> ApiResult<Json<Vec<PatientAccess>>> {
    Ok(Json(access::list_grants(&state.pool, &identity, query.user_id).await?))
}

#[utoipa::path(
    post,
    path = "/api/patient-access",
    request_body = GrantReq,
    responses(
        (status = 201, description = "Grant created", body = PatientAccess),
        (status = 404, description = "User or patient not found"),
        (status = 409, description = "Grant already exists")
    ),
    security(("bearer" = []))
)]
#[axum::debug_handler]
pub async fn grant(
    State(state): State<AppState>,
    Caller(identity): Caller,
    Json(req): Json<GrantReq>,
) -> ApiResult<(StatusCode, Json<PatientAccess>)> {
    let created = access::grant(
        &state.pool,
        &identity,
        req.user_id,
        req.patient_id,
        req.relationship.as_deref(),
    )
    .await?;
    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(
    delete,
    path = "/api/patient-access",
    request_body = GrantReq,
    responses(
        (status = 204, description = "Grant removed"),
        (status = 404, description = "Grant not found")
    ),
    security(("bearer" = []))
)]
#[axum::debug_handler]
pub async fn revoke(
    State(state): State<AppState>,
    Caller(identity): Caller,
    Json(req): Json<GrantReq>,
) -> ApiResult<StatusCode> {
    access::revoke(&state.pool, &identity, req.user_id, req.patient_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
