//! Appointments, lab bookings and the slot availability listing.

use crate::entities::Booking;
use crate::services::{access, Bind};
use crate::{CoreError, CoreResult, Identity};
use chrono::{NaiveDate, NaiveTime, Utc};
use serde::Deserialize;
use sqlx::SqlitePool;
use std::collections::HashSet;
use tracing::info;
use utoipa::IntoParams;

const DEFAULT_WINDOW_START: &str = "09:00";
const DEFAULT_WINDOW_END: &str = "17:00";
const DEFAULT_STEP_MINUTES: i64 = 30;

/// Query parameters for the slot listing.
#[derive(Debug, Clone, Deserialize, IntoParams)]
#[serde(deny_unknown_fields)]
pub struct SlotQuery {
    pub doctor: i64,
    /// ISO calendar date (YYYY-MM-DD)
    pub date: String,
    /// Window start, HH:MM (default 09:00)
    pub start: Option<String>,
    /// Window end, HH:MM, exclusive (default 17:00)
    pub end: Option<String>,
    /// Grid step in minutes (default 30)
    pub step: Option<i64>,
}

#[derive(Debug, Default, Clone, Deserialize, IntoParams)]
#[serde(deny_unknown_fields)]
pub struct BookingFilter {
    pub patient_id: Option<i64>,
    pub doctor_id: Option<i64>,
    pub booking_type: Option<String>,
    pub status: Option<String>,
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Deserialize, utoipa::ToSchema)]
pub struct NewBooking {
    pub patient_id: Option<i64>,
    /// appointment / lab
    pub booking_type: String,
    pub department_id: Option<i64>,
    pub doctor_id: Option<i64>,
    pub slot_date: NaiveDate,
    /// HH:MM
    pub slot_time: String,
    pub notes: Option<String>,
}

/// Free times for a doctor on a date: the full grid minus every time held by
/// a non-cancelled booking. Ascending, end-exclusive, no duplicates.
pub async fn available_slots(pool: &SqlitePool, query: &SlotQuery) -> CoreResult<Vec<String>> {
    let date = parse_date(&query.date)?;
    let start = parse_time(query.start.as_deref().unwrap_or(DEFAULT_WINDOW_START))?;
    let end = parse_time(query.end.as_deref().unwrap_or(DEFAULT_WINDOW_END))?;
    let step = query.step.unwrap_or(DEFAULT_STEP_MINUTES);
    if step <= 0 || step >= 24 * 60 {
        return Err(CoreError::InvalidInput(
            "step must be between 1 and 1439 minutes.".into(),
        ));
    }
    if start >= end {
        return Err(CoreError::InvalidInput("start must precede end.".into()));
    }

    let doctor: Option<i64> = sqlx::query_scalar("SELECT id FROM doctor WHERE id = ?1")
        .bind(query.doctor)
        .fetch_optional(pool)
        .await?;
    if doctor.is_none() {
        return Err(CoreError::NotFound("Doctor not found.".into()));
    }

    let taken: Vec<NaiveTime> = sqlx::query_scalar(
        "SELECT slot_time FROM booking
         WHERE doctor_id = ?1 AND slot_date = ?2 AND LOWER(status) <> 'cancelled'",
    )
    .bind(query.doctor)
    .bind(date)
    .fetch_all(pool)
    .await?;
    let taken: HashSet<NaiveTime> = taken.into_iter().collect();

    Ok(slot_grid(start, end, step)
        .into_iter()
        .filter(|slot| !taken.contains(slot))
        .map(|slot| slot.format("%H:%M").to_string())
        .collect())
}

/// Books a slot for the caller. The booked time must lie on some grid, but
/// any in-window time is accepted; clashing with a live booking conflicts.
pub async fn create(
    pool: &SqlitePool,
    identity: &Identity,
    new: &NewBooking,
) -> CoreResult<Booking> {
    let user = access::require_account(identity)?;
    let slot_time = parse_time(&new.slot_time)?;
    let booking_type = new.booking_type.trim().to_lowercase();
    if !matches!(booking_type.as_str(), "appointment" | "lab") {
        return Err(CoreError::InvalidInput(
            "booking_type must be appointment or lab.".into(),
        ));
    }
    if let Some(patient_id) = new.patient_id {
        access::authorize_patient(pool, identity, patient_id).await?;
    }

    if let Some(doctor_id) = new.doctor_id {
        let clash: Option<i64> = sqlx::query_scalar(
            "SELECT id FROM booking
             WHERE doctor_id = ?1 AND slot_date = ?2 AND slot_time = ?3
               AND LOWER(status) <> 'cancelled'
             LIMIT 1",
        )
        .bind(doctor_id)
        .bind(new.slot_date)
        .bind(slot_time)
        .fetch_optional(pool)
        .await?;
        if clash.is_some() {
            return Err(CoreError::Conflict("Slot is already booked.".into()));
        }
    }

    let id = sqlx::query(
        "INSERT INTO booking
            (user_id, patient_id, booking_type, department_id, doctor_id,
             slot_date, slot_time, status, notes, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 'booked', ?8, ?9)",
    )
    .bind(user.id)
    .bind(new.patient_id)
    .bind(&booking_type)
    .bind(new.department_id)
    .bind(new.doctor_id)
    .bind(new.slot_date)
    .bind(slot_time)
    .bind(new.notes.as_deref())
    .bind(Utc::now())
    .execute(pool)
    .await?
    .last_insert_rowid();

    info!(booking_id = id, booking_type, "booking created");
    fetch(pool, id).await
}

/// Lists bookings: staff see everything, AppUsers their own rows only.
pub async fn list(
    pool: &SqlitePool,
    identity: &Identity,
    filter: &BookingFilter,
) -> CoreResult<Vec<Booking>> {
    let mut sql = String::from("SELECT * FROM booking WHERE 1 = 1");
    let mut binds: Vec<Bind> = Vec::new();

    match identity {
        Identity::Staff(_) => {}
        Identity::AppUser(user) => {
            binds.push(Bind::Int(user.id));
            sql.push_str(&format!(" AND user_id = ?{}", binds.len()));
        }
        Identity::Anonymous => return Ok(Vec::new()),
    }
    if let Some(patient_id) = filter.patient_id {
        binds.push(Bind::Int(patient_id));
        sql.push_str(&format!(" AND patient_id = ?{}", binds.len()));
    }
    if let Some(doctor_id) = filter.doctor_id {
        binds.push(Bind::Int(doctor_id));
        sql.push_str(&format!(" AND doctor_id = ?{}", binds.len()));
    }
    if let Some(kind) = filter.booking_type.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        binds.push(Bind::Text(kind.to_lowercase()));
        sql.push_str(&format!(" AND LOWER(booking_type) = ?{}", binds.len()));
    }
    if let Some(status) = filter.status.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        binds.push(Bind::Text(status.to_lowercase()));
        sql.push_str(&format!(" AND LOWER(status) = ?{}", binds.len()));
    }
    if let Some(date) = filter.date {
        binds.push(Bind::Text(date.format("%Y-%m-%d").to_string()));
        sql.push_str(&format!(" AND slot_date = ?{}", binds.len()));
    }
    sql.push_str(" ORDER BY slot_date DESC, slot_time DESC, id DESC");

    let mut query = sqlx::query_as::<_, Booking>(&sql);
    for bind in binds {
        query = match bind {
            Bind::Text(text) => query.bind(text),
            Bind::Int(int) => query.bind(int),
            Bind::At(at) => query.bind(at),
        };
    }
    Ok(query.fetch_all(pool).await?)
}

/// Cancels a booking. Owners and staff only; cancelling twice is a no-op.
pub async fn cancel(pool: &SqlitePool, identity: &Identity, id: i64) -> CoreResult<Booking> {
    let booking = fetch(pool, id).await?;
    match identity {
        Identity::Staff(_) => {}
        Identity::AppUser(user) if user.id == booking.user_id => {}
        Identity::AppUser(_) => {
            return Err(CoreError::Forbidden("Not your booking.".into()))
        }
        Identity::Anonymous => {
            return Err(CoreError::Unauthorized("Authentication required.".into()))
        }
    }

    sqlx::query("UPDATE booking SET status = 'cancelled' WHERE id = ?1")
        .bind(id)
        .execute(pool)
        .await?;
    fetch(pool, id).await
}

async fn fetch(pool: &SqlitePool, id: i64) -> CoreResult<Booking> {
    let booking = sqlx::query_as::<_, Booking>("SELECT * FROM booking WHERE id = ?1")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| CoreError::NotFound("Booking not found.".into()))?;
    Ok(booking)
}

fn slot_grid(start: NaiveTime, end: NaiveTime, step_minutes: i64) -> Vec<NaiveTime> {
    let mut slots = Vec::new();
    let mut cursor = start;
    while cursor < end {
        slots.push(cursor);
        cursor += chrono::Duration::minutes(step_minutes);
        // Stepping past midnight wraps NaiveTime; stop rather than loop.
        if cursor <= start {
            break;
        }
    }
    slots
}

fn parse_date(raw: &str) -> CoreResult<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| CoreError::InvalidInput(format!("invalid date: {raw}")))
}

fn parse_time(raw: &str) -> CoreResult<NaiveTime> {
    let raw = raw.trim();
    NaiveTime::parse_from_str(raw, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M:%S"))
        .map_err(|_| CoreError::InvalidInput(format!("invalid time: {raw}")))
}
