//! Master-data endpoints: departments, doctors, wards, beds.

use crate::dto::{BedReq, DepartmentReq, DoctorReq, WardReq};
use crate::error::ApiResult;
use crate::extract::Caller;
use crate::AppState;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use healthvault_core::entities::{Bed, Department, Doctor, Ward};
use healthvault_core::services::masters::{self, BedFilter, DoctorFilter, WardFilter};

#[utoipa::path(
    get,
    path = "/api/departments",
    responses((status = 200, description = "All departments", body = [Department]))
)]
#[axum::debug_handler]
pub async fn departments(State(state): State<AppState>) -> ApiResult<Json<Vec<Department>>> {
    Ok(Json(masters::list_departments(&state.pool).await?))
}

#[utoipa::path(
    post,
    path = "/api/departments",
    request_body = DepartmentReq,
    responses(
        (status = 201, description = "Department created", body = Department),
        (status = 403, description = "Staff access required")
    ),
    security(("bearer" = []))
)]
#[axum::debug_handler]
pub async fn create_department(
    State(state): State<AppState>,
    Caller(identity): Caller,
    Json(req): Json<DepartmentReq>,
) -> ApiResult<(StatusCode, Json<Department>)> {
    let department =
        masters::create_department(&state.pool, &identity, &req.name, req.description.as_deref())
            .await?;
    Ok((StatusCode::CREATED, Json(department)))
}

#[utoipa::path(
    get,
    path = "/api/doctors",
    params(DoctorFilter),
    responses((status = 200, description = "Doctors", body = [Doctor]))
)]
#[axum::debug_handler]
pub async fn doctors(
    State(state): State<AppState>,
    Query(filter): Query<DoctorFilter>,
) -> ApiResult<Json<Vec<Doctor>>> {
    Ok(Json(masters::list_doctors(&state.pool, &filter).await?))
}

#[utoipa::path(
    post,
    path = "/api/doctors",
    request_body = DoctorReq,
    responses(
        (status = 201, description = "Doctor created", body = Doctor),
        (status = 403, description = "Staff access required")
    ),
    security(("bearer" = []))
)]
#[axum::debug_handler]
pub async fn create_doctor(
    State(state): State<AppState>,
    Caller(identity): Caller,
    Json(req): Json<DoctorReq>,
) -> ApiResult<(StatusCode, Json<Doctor>)> {
    let doctor = masters::create_doctor(
        &state.pool,
        &identity,
        req.department_id,
        &req.full_name,
        req.qualification.as_deref(),
        req.experience_years,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(doctor)))
}

#[utoipa::path(
    get,
    path = "/api/wards",
    params(WardFilter),
    responses((status = 200, description = "Wards", body = [Ward]))
)]
#[axum::debug_handler]
pub async fn wards(
    State(state): State<AppState>,
    Query(filter): Query<WardFilter>,
) -> ApiResult<Json<Vec<Ward>>> {
    Ok(Json(masters::list_wards(&state.pool, &filter).await?))
}

#[utoipa::path(
    post,
    path = "/api/wards",
    request_body = WardReq,
    responses(
        (status = 201, description = "Ward created", body = Ward),
        (status = 403, description = "Staff access required")
    ),
    security(("bearer" = []))
)]
#[axum::debug_handler]
pub async fn create_ward(
    State(state): State<AppState>,
    Caller(identity): Caller,
    Json(req): Json<WardReq>,
) -> ApiResult<(StatusCode, Json<Ward>)> {
    let ward =
        masters::create_ward(&state.pool, &identity, req.department_id, &req.name, req.floor)
            .await?;
    Ok((StatusCode::CREATED, Json(ward)))
}

#[utoipa::path(
    get,
    path = "/api/beds",
    params(BedFilter),
    responses((status = 200, description = "Beds", body = [Bed]))
)]
#[axum::debug_handler]
pub async fn beds(
    State(state): State<AppState>,
    Query(filter): Query<BedFilter>,
) -> ApiResult<Json<Vec<Bed>>> {
    Ok(Json(masters::list_beds(&state.pool, &filter).await?))
}

#[utoipa::path(
    post,
    path = "/api/beds",
    request_body = BedReq,
    responses(
        (status = 201, description = "Bed created", body = Bed),
        (status = 403, description = "Staff access required"),
        (status = 404, description = "Ward not found")
    ),
    security(("bearer" = []))
)]
#[axum::debug_handler]
pub async fn create_bed(
    State(state): State<AppState>,
    Caller(identity): Caller,
    Json(req): Json<BedReq>,
) -> ApiResult<(StatusCode, Json<Bed>)> {
    let bed = masters::create_bed(&state.pool, &identity, req.ward_id, &req.code).await?;
    Ok((StatusCode::CREATED, Json(bed)))
}
