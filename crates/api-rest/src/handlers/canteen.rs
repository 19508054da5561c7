//! Canteen menu and order endpoints.

use crate::dto::{AddItemReq, CreateOrderReq, UpdateItemReq};
use crate::error::ApiResult;
use crate::extract::Caller;
use crate::AppState;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use healthvault_core::entities::{CanteenOrder, MenuItem};
use healthvault_core::services::canteen::{self, MenuFilter, OrderFilter, OrderView};

#[utoipa::path(
    get,
    path = "/api/menu",
    params(MenuFilter),
    responses((status = 200, description = "Menu items", body = [MenuItem]))
)]
#[axum::debug_handler]
pub async fn menu(
    State(state): State<AppState>,
    Query(filter): Query<MenuFilter>,
) -> ApiResult<Json<Vec<MenuItem>>> {
    Ok(Json(canteen::list_menu(&state.pool, &filter).await?))
}

#[utoipa::path(
    get,
    path = "/api/canteen-orders",
    params(OrderFilter),
    responses((status = 200, description = "Orders visible to the caller", body = [CanteenOrder])),
    security(("bearer" = []))
)]
#[axum::debug_handler]
pub async fn list(
    State(state): State<AppState>,
    Caller(identity): Caller,
    Query(filter): Query<OrderFilter>,
) -> ApiResult<Json<Vec<CanteenOrder>>> {
    Ok(Json(canteen::list_orders(&state.pool, &identity, &filter).await?))
}

#[utoipa::path(
    post,
    path = "/api/canteen-orders",
    request_body = CreateOrderReq,
    responses(
        (status = 201, description = "Empty order opened", body = OrderView),
        (status = 401, description = "Authentication required")
    ),
    security(("bearer" = []))
)]
#[axum::debug_handler]
pub async fn create(
    State(state): State<AppState>,
    Caller(identity): Caller,
    Json(req): Json<CreateOrderReq>,
) -> ApiResult<(StatusCode, Json<OrderView>)> {
    let order = canteen::create_order(&state.pool, &identity, req.patient_id).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

#[utoipa::path(
    get,
    path = "/api/canteen-orders/{id}",
    params(("id" = i64, Path, description = "Order id")),
    responses(
        (status = 200, description = "Order with line items", body = OrderView),
        (status = 404, description = "Order not found")
    ),
    security(("bearer" = []))
)]
#[axum::debug_handler]
pub async fn get(
    State(state): State<AppState>,
    Caller(identity): Caller,
    Path(id): Path<i64>,
) -> ApiResult<Json<OrderView>> {
    Ok(Json(canteen::get_order(&state.pool, &identity, id).await?))
}

#[utoipa::path(
    post,
    path = "/api/canteen-orders/{id}/add-item",
    params(("id" = i64, Path, description = "Order id")),
    request_body = AddItemReq,
    responses(
        (status = 200, description = "Order with recomputed total", body = OrderView),
        (status = 400, description = "Non-positive quantity"),
        (status = 404, description = "Order or menu item not found")
    ),
    security(("bearer" = []))
)]
/// Adds a line item at the menu item's current price and returns the order
/// with its freshly recomputed total.
#[axum::debug_handler]
pub async fn add_item(
    State(state): State<AppState>,
    Caller(identity): Caller,
    Path(id): Path<i64>,
    Json(req): Json<AddItemReq>,
) -> ApiResult<Json<OrderView>> {
    let order = canteen::add_item(&state.pool, &identity, id, req.menu_item, req.qty).await?;
    Ok(Json(order))
}

#[utoipa::path(
    put,
    path = "/api/canteen-orders/{id}/items/{item_id}",
    params(
        ("id" = i64, Path, description = "Order id"),
        ("item_id" = i64, Path, description = "Line item id")
    ),
    request_body = UpdateItemReq,
    responses(
        (status = 200, description = "Order with recomputed total", body = OrderView),
        (status = 403, description = "Staff access required"),
        (status = 404, description = "Line item not found")
    ),
    security(("bearer" = []))
)]
/// Administrative line-item edit; the unit price is re-derived from the
/// menu unless an explicit override is supplied.
#[axum::debug_handler]
pub async fn update_item(
    State(state): State<AppState>,
    Caller(identity): Caller,
    Path((id, item_id)): Path<(i64, i64)>,
    Json(req): Json<UpdateItemReq>,
) -> ApiResult<Json<OrderView>> {
    let order =
        canteen::update_item(&state.pool, &identity, id, item_id, req.qty, req.price_cents).await?;
    Ok(Json(order))
}

#[utoipa::path(
    delete,
    path = "/api/canteen-orders/{id}/items/{item_id}",
    params(
        ("id" = i64, Path, description = "Order id"),
        ("item_id" = i64, Path, description = "Line item id")
    ),
    responses(
        (status = 200, description = "Order with recomputed total", body = OrderView),
        (status = 404, description = "Line item not found")
    ),
    security(("bearer" = []))
)]
#[axum::debug_handler]
pub async fn delete_item(
    State(state): State<AppState>,
    Caller(identity): Caller,
    Path((id, item_id)): Path<(i64, i64)>,
) -> ApiResult<Json<OrderView>> {
    Ok(Json(canteen::delete_item(&state.pool, &identity, id, item_id).await?))
}

#[utoipa::path(
    post,
    path = "/api/canteen-orders/{id}/mark-paid",
    params(("id" = i64, Path, description = "Order id")),
    responses(
        (status = 200, description = "Order marked paid", body = OrderView),
        (status = 403, description = "Staff access required"),
        (status = 404, description = "Order not found")
    ),
    security(("bearer" = []))
)]
#[axum::debug_handler]
pub async fn mark_paid(
    State(state): State<AppState>,
    Caller(identity): Caller,
    Path(id): Path<i64>,
) -> ApiResult<Json<OrderView>> {
    Ok(Json(canteen::mark_paid(&state.pool, &identity, id).await?))
}

#[utoipa::path(
    put,
    path = "/api/canteen-order-items/{item_id}",
    params(("item_id" = i64, Path, description = "Line item id")),
    request_body = UpdateItemReq,
    responses(
        (status = 200, description = "Order with recomputed total", body = OrderView),
        (status = 403, description = "Staff access required"),
        (status = 404, description = "Line item not found")
    ),
    security(("bearer" = []))
)]
/// Same edit as the nested route, addressed by item id alone.
#[axum::debug_handler]
pub async fn update_item_by_id(
    State(state): State<AppState>,
    Caller(identity): Caller,
    Path(item_id): Path<i64>,
    Json(req): Json<UpdateItemReq>,
) -> ApiResult<Json<OrderView>> {
    let order_id = canteen::item_order_id(&state.pool, item_id).await?;
    let order =
        canteen::update_item(&state.pool, &identity, order_id, item_id, req.qty, req.price_cents)
            .await?;
    Ok(Json(order))
}

#[utoipa::path(
    delete,
    path = "/api/canteen-order-items/{item_id}",
    params(("item_id" = i64, Path, description = "Line item id")),
    responses(
        (status = 200, description = "Order with recomputed total", body = OrderView),
        (status = 404, description = "Line item not found")
    ),
    security(("bearer" = []))
)]
#[axum::debug_handler]
pub async fn delete_item_by_id(
    State(state): State<AppState>,
    Caller(identity): Caller,
    Path(item_id): Path<i64>,
) -> ApiResult<Json<OrderView>> {
    let order_id = canteen::item_order_id(&state.pool, item_id).await?;
    Ok(Json(canteen::delete_item(&state.pool, &identity, order_id, item_id).await?))
}
