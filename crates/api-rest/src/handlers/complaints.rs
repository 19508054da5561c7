//! Complaint endpoints.

use crate::dto::StatusReq;
use crate::error::ApiResult;
use crate::extract::Caller;
use crate::AppState;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use healthvault_core::entities::Complaint;
use healthvault_core::services::complaints::{self, ComplaintFilter, NewComplaint};

#[utoipa::path(
    get,
    path = "/api/complaints",
    params(ComplaintFilter),
    responses((status = 200, description = "Complaints visible to the caller", body = [Complaint])),
    security(("bearer" = []))
)]
#[axum::debug_handler]
pub async fn list(
    State(state): State<AppState>,
    Caller(identity): Caller,
    Query(filter): Query<ComplaintFilter>,
) -> ApiResult<Json<Vec<Complaint>>> {
    Ok(Json(complaints::list(&state.pool, &identity, &filter).await?))
}

#[utoipa::path(
    get,
    path = "/api/complaints/my",
    responses((status = 200, description = "The caller's own complaints", body = [Complaint])),
    security(("bearer" = []))
)]
#[axum::debug_handler]
pub async fn my(
    State(state): State<AppState>,
    Caller(identity): Caller,
) -> ApiResult<Json<Vec<Complaint>>> {
    let filter = ComplaintFilter { mine: Some(true), ..Default::default() };
    Ok(Json(complaints::list(&state.pool, &identity, &filter).await?))
}

#[utoipa::path(
    post,
    path = "/api/complaints",
    request_body = NewComplaint,
    responses(
        (status = 201, description = "Complaint filed", body = Complaint),
        (status = 403, description = "No access to this patient")
    ),
    security(("bearer" = []))
)]
/// Files a complaint; ward, bed and admission auto-fill from the patient's
/// active admission when omitted.
#[axum::debug_handler]
pub async fn create(
    State(state): State<AppState>,
    Caller(identity): Caller,
    Json(req): Json<NewComplaint>,
) -> ApiResult<(StatusCode, Json<Complaint>)> {
    let complaint = complaints::create(&state.pool, &identity, &req).await?;
    Ok((StatusCode::CREATED, Json(complaint)))
}

#[utoipa::path(
    put,
    path = "/api/complaints/{id}/status",
    params(("id" = i64, Path, description = "Complaint id")),
    request_body = StatusReq,
    responses(
        (status = 200, description = "Complaint updated", body = Complaint),
        (status = 400, description = "Unknown status"),
        (status = 403, description = "Staff access required")
    ),
    security(("bearer" = []))
)]
#[axum::debug_handler]
pub async fn update_status(
    State(state): State<AppState>,
    Caller(identity): Caller,
    Path(id): Path<i64>,
    Json(req): Json<StatusReq>,
) -> ApiResult<Json<Complaint>> {
    Ok(Json(complaints::update_status(&state.pool, &identity, id, &req.status).await?))
}
