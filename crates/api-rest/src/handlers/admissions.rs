//! Admission and admission-task endpoints.

use crate::dto::StatusReq;
use crate::error::ApiResult;
use crate::extract::Caller;
use crate::AppState;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use healthvault_core::entities::{Admission, AdmissionTask};
use healthvault_core::services::admissions::{self, AdmissionFilter, NewAdmission, NewTask};

#[utoipa::path(
    get,
    path = "/api/admissions",
    params(AdmissionFilter),
    responses((status = 200, description = "Admissions visible to the caller", body = [Admission])),
    security(("bearer" = []))
)]
#[axum::debug_handler]
pub async fn list(
    State(state): State<AppState>,
    Caller(identity): Caller,
    Query(filter): Query<AdmissionFilter>,
) -> ApiResult<Json<Vec<Admission>>> {
    Ok(Json(admissions::list(&state.pool, &identity, &filter).await?))
}

#[utoipa::path(
    get,
    path = "/api/admissions/{id}",
    params(("id" = i64, Path, description = "Admission id")),
    responses(
        (status = 200, description = "Admission", body = Admission),
        (status = 404, description = "Not found or out of scope")
    ),
    security(("bearer" = []))
)]
#[axum::debug_handler]
pub async fn get(
    State(state): State<AppState>,
    Caller(identity): Caller,
    Path(id): Path<i64>,
) -> ApiResult<Json<Admission>> {
    Ok(Json(admissions::get(&state.pool, &identity, id).await?))
}

#[utoipa::path(
    post,
    path = "/api/admissions",
    request_body = NewAdmission,
    responses(
        (status = 201, description = "Patient admitted", body = Admission),
        (status = 404, description = "Patient or bed not found"),
        (status = 409, description = "Bed not available")
    ),
    security(("bearer" = []))
)]
#[axum::debug_handler]
pub async fn create(
    State(state): State<AppState>,
    Caller(identity): Caller,
    Json(req): Json<NewAdmission>,
) -> ApiResult<(StatusCode, Json<Admission>)> {
    let admission = admissions::create(&state.pool, &identity, &req).await?;
    Ok((StatusCode::CREATED, Json(admission)))
}

#[utoipa::path(
    post,
    path = "/api/admissions/{id}/discharge",
    params(("id" = i64, Path, description = "Admission id")),
    responses(
        (status = 200, description = "Patient discharged", body = Admission),
        (status = 400, description = "Admission not active"),
        (status = 404, description = "Admission not found")
    ),
    security(("bearer" = []))
)]
#[axum::debug_handler]
pub async fn discharge(
    State(state): State<AppState>,
    Caller(identity): Caller,
    Path(id): Path<i64>,
) -> ApiResult<Json<Admission>> {
    Ok(Json(admissions::discharge(&state.pool, &identity, id).await?))
}

#[utoipa::path(
    get,
    path = "/api/admissions/{id}/tasks",
    params(("id" = i64, Path, description = "Admission id")),
    responses((status = 200, description = "Tasks for the admission", body = [AdmissionTask])),
    security(("bearer" = []))
)]
#[axum::debug_handler]
pub async fn list_tasks(
    State(state): State<AppState>,
    Caller(identity): Caller,
    Path(id): Path<i64>,
) -> ApiResult<Json<Vec<AdmissionTask>>> {
    Ok(Json(admissions::list_tasks(&state.pool, &identity, id).await?))
}

#[utoipa::path(
    post,
    path = "/api/admissions/{id}/tasks",
    params(("id" = i64, Path, description = "Admission id")),
    request_body = NewTask,
    responses(
        (status = 201, description = "Task created", body = AdmissionTask),
        (status = 403, description = "Staff access required")
    ),
    security(("bearer" = []))
)]
#[axum::debug_handler]
pub async fn create_task(
    State(state): State<AppState>,
    Caller(identity): Caller,
    Path(id): Path<i64>,
    Json(req): Json<NewTask>,
) -> ApiResult<(StatusCode, Json<AdmissionTask>)> {
    let task = admissions::create_task(&state.pool, &identity, id, &req).await?;
    Ok((StatusCode::CREATED, Json(task)))
}

#[utoipa::path(
    put,
    path = "/api/admission-tasks/{id}",
    params(("id" = i64, Path, description = "Task id")),
    request_body = StatusReq,
    responses(
        (status = 200, description = "Task updated", body = AdmissionTask),
        (status = 404, description = "Task not found")
    ),
    security(("bearer" = []))
)]
#[axum::debug_handler]
pub async fn update_task(
    State(state): State<AppState>,
    Caller(identity): Caller,
    Path(id): Path<i64>,
    Json(req): Json<StatusReq>,
) -> ApiResult<Json<AdmissionTask>> {
    Ok(Json(admissions::update_task_status(&state.pool, &identity, id, &req.status).await?))
}
