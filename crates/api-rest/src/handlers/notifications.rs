//! Notification endpoints.

use crate::error::ApiResult;
use crate::extract::Caller;
use crate::AppState;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use healthvault_core::entities::Notification;
use healthvault_core::services::notifications::{self, NewNotification};

#[utoipa::path(
    get,
    path = "/api/notifications",
    responses((status = 200, description = "Notifications visible to the caller", body = [Notification])),
    security(("bearer" = []))
)]
/// Lists targeted notifications plus, while a granted patient is admitted,
/// ward broadcasts.
#[axum::debug_handler]
pub async fn list(
    State(state): State<AppState>,
    Caller(identity): Caller,
) -> ApiResult<Json<Vec<Notification>>> {
    Ok(Json(notifications::list(&state.pool, &identity).await?))
}

#[utoipa::path(
    post,
    path = "/api/notifications",
    request_body = NewNotification,
    responses(
        (status = 201, description = "Notification sent", body = Notification),
        (status = 403, description = "Staff access required"),
        (status = 404, description = "Target user not found")
    ),
    security(("bearer" = []))
)]
#[axum::debug_handler]
pub async fn create(
    State(state): State<AppState>,
    Caller(identity): Caller,
    Json(req): Json<NewNotification>,
) -> ApiResult<(StatusCode, Json<Notification>)> {
    let notification = notifications::create(&state.pool, &identity, &req).await?;
    Ok((StatusCode::CREATED, Json(notification)))
}

#[utoipa::path(
    post,
    path = "/api/notifications/{id}/mark-read",
    params(("id" = i64, Path, description = "Notification id")),
    responses(
        (status = 200, description = "Notification marked read", body = Notification),
        (status = 400, description = "Broadcasts carry no read state"),
        (status = 404, description = "Not found or not yours")
    ),
    security(("bearer" = []))
)]
#[axum::debug_handler]
pub async fn mark_read(
    State(state): State<AppState>,
    Caller(identity): Caller,
    Path(id): Path<i64>,
) -> ApiResult<Json<Notification>> {
    Ok(Json(notifications::mark_read(&state.pool, &identity, id).await?))
}
