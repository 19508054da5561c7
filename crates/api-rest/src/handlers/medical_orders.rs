//! Clinical order endpoints (staff only).

use crate::dto::StatusReq;
use crate::error::ApiResult;
use crate::extract::Caller;
use crate::AppState;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use healthvault_core::entities::MedicalOrder;
use healthvault_core::services::medical_orders::{self, MedicalOrderFilter, NewMedicalOrder};

#[utoipa::path(
    get,
    path = "/api/medical-orders",
    params(MedicalOrderFilter),
    responses(
        (status = 200, description = "Orders matching the filter", body = [MedicalOrder]),
        (status = 403, description = "Staff only")
    ),
    security(("bearer" = []))
)]
#[axum::debug_handler]
pub async fn list(
    State(state): State<AppState>,
    Caller(identity): Caller,
    Query(filter): Query<MedicalOrderFilter>,
) -> ApiResult<Json<Vec<MedicalOrder>>> {
    Ok(Json(medical_orders::list(&state.pool, &identity, &filter).await?))
}

#[utoipa::path(
    post,
    path = "/api/medical-orders",
    request_body = NewMedicalOrder,
    responses(
        (status = 201, description = "Order placed", body = MedicalOrder),
        (status = 403, description = "Staff only"),
        (status = 404, description = "Admission not found")
    ),
    security(("bearer" = []))
)]
#[axum::debug_handler]
pub async fn create(
    State(state): State<AppState>,
    Caller(identity): Caller,
    Json(new): Json<NewMedicalOrder>,
) -> ApiResult<(StatusCode, Json<MedicalOrder>)> {
    let order = medical_orders::create(&state.pool, &identity, &new).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

#[utoipa::path(
    put,
    path = "/api/medical-orders/{id}",
    params(("id" = i64, Path, description = "Order id")),
    request_body = StatusReq,
    responses(
        (status = 200, description = "Updated order", body = MedicalOrder),
        (status = 403, description = "Staff only"),
        (status = 404, description = "Order not found")
    ),
    security(("bearer" = []))
)]
#[axum::debug_handler]
pub async fn update_status(
    State(state): State<AppState>,
    Caller(identity): Caller,
    Path(id): Path<i64>,
    Json(req): Json<StatusReq>,
) -> ApiResult<Json<MedicalOrder>> {
    let order = medical_orders::update_status(&state.pool, &identity, id, &req.status).await?;
    Ok(Json(order))
}
