//! Slot availability and booking endpoints.

use crate::dto::SlotsRes;
use crate::error::ApiResult;
use crate::extract::Caller;
use crate::AppState;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use healthvault_core::entities::Booking;
use healthvault_core::services::bookings::{self, BookingFilter, NewBooking, SlotQuery};

#[utoipa::path(
    get,
    path = "/api/slots",
    params(SlotQuery),
    responses(
        (status = 200, description = "Free slots for the doctor and date", body = SlotsRes),
        (status = 400, description = "Malformed date, time or step"),
        (status = 404, description = "Doctor not found")
    )
)]
/// Free appointment times for a doctor on a date.
#[axum::debug_handler]
pub async fn slots(
    State(state): State<AppState>,
    Query(query): Query<SlotQuery>,
) -> ApiResult<Json<SlotsRes>> {
    let slots = bookings::available_slots(&state.pool, &query).await?;
    Ok(Json(SlotsRes {
        doctor: query.doctor,
        date: query.date,
        start: query.start.unwrap_or_else(|| "09:00".into()),
        end: query.end.unwrap_or_else(|| "17:00".into()),
        step_minutes: query.step.unwrap_or(30),
        slots,
    }))
}

#[utoipa::path(
    get,
    path = "/api/bookings",
    params(BookingFilter),
    responses((status = 200, description = "Bookings visible to the caller", body = [Booking])),
    security(("bearer" = []))
)]
#[axum::debug_handler]
pub async fn list(
    State(state): State<AppState>,
    Caller(identity): Caller,
    Query(filter): Query<BookingFilter>,
) -> ApiResult<Json<Vec<Booking>>> {
    Ok(Json(bookings::list(&state.pool, &identity, &filter).await?))
}

#[utoipa::path(
    post,
    path = "/api/bookings",
    request_body = NewBooking,
    responses(
        (status = 201, description = "Booking created", body = Booking),
        (status = 400, description = "Bad slot or booking type"),
        (status = 409, description = "Slot already taken")
    ),
    security(("bearer" = []))
)]
#[axum::debug_handler]
pub async fn create(
    State(state): State<AppState>,
    Caller(identity): Caller,
    Json(req): Json<NewBooking>,
) -> ApiResult<(StatusCode, Json<Booking>)> {
    let booking = bookings::create(&state.pool, &identity, &req).await?;
    Ok((StatusCode::CREATED, Json(booking)))
}

#[utoipa::path(
    post,
    path = "/api/bookings/{id}/cancel",
    params(("id" = i64, Path, description = "Booking id")),
    responses(
        (status = 200, description = "Booking cancelled", body = Booking),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Booking not found")
    ),
    security(("bearer" = []))
)]
#[axum::debug_handler]
pub async fn cancel(
    State(state): State<AppState>,
    Caller(identity): Caller,
    Path(id): Path<i64>,
) -> ApiResult<Json<Booking>> {
    Ok(Json(bookings::cancel(&state.pool, &identity, id).await?))
}
