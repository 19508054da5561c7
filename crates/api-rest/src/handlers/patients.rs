//! Patient index endpoints.

use crate::error::ApiResult;
use crate::extract::Caller;
use crate::AppState;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use healthvault_core::entities::PatientRecord;
use healthvault_core::services::patients::{self, NewPatient, PatientFilter};

#[utoipa::path(
    get,
    path = "/api/patients",
    params(PatientFilter),
    responses((status = 200, description = "Patients visible to the caller", body = [PatientRecord])),
    security(("bearer" = []))
)]
/// Lists patients. AppUsers see only their granted patients; anonymous
/// callers get an empty list.
#[axum::debug_handler]
pub async fn list(
    State(state): State<AppState>,
    Caller(identity): Caller,
    Query(filter): Query<PatientFilter>,
) -> ApiResult<Json<Vec<PatientRecord>>> {
    Ok(Json(patients::list(&state.pool, &identity, &filter).await?))
}

#[utoipa::path(
    get,
    path = "/api/patients/{id}",
    params(("id" = i64, Path, description = "Patient id")),
    responses(
        (status = 200, description = "Patient record", body = PatientRecord),
        (status = 404, description = "Not found or out of scope")
    ),
    security(("bearer" = []))
)]
#[axum::debug_handler]
pub async fn get(
    State(state): State<AppState>,
    Caller(identity): Caller,
    Path(id): Path<i64>,
) -> ApiResult<Json<PatientRecord>> {
    Ok(Json(patients::get(&state.pool, &identity, id).await?))
}

#[utoipa::path(
    post,
    path = "/api/patients",
    request_body = NewPatient,
    responses(
        (status = 201, description = "Patient registered", body = PatientRecord),
        (status = 409, description = "Duplicate MRN")
    ),
    security(("bearer" = []))
)]
#[axum::debug_handler]
pub async fn create(
    State(state): State<AppState>,
    Caller(identity): Caller,
    Json(req): Json<NewPatient>,
) -> ApiResult<(StatusCode, Json<PatientRecord>)> {
    let patient = patients::create(&state.pool, &identity, &req).await?;
    Ok((StatusCode::CREATED, Json(patient)))
}
