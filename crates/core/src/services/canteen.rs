//! Canteen ordering and the order pricing engine.
//!
//! The pricing rules, in one place:
//!
//! - a line item captures the menu item's price at the moment it is added;
//!   the client never supplies a price on the primary flow
//! - `canteen_order.total_cents` is recomputed from a fresh aggregate over
//!   all line items after every mutation, never adjusted incrementally
//! - capture, insert and recompute run inside one transaction per order, so
//!   concurrent additions to the same order cannot interleave a stale total
//!
//! Staff may edit line items directly; the unit price is still re-derived
//! from the menu unless an explicit override price accompanies the edit, and
//! the total is recomputed once after the edit lands.

use crate::entities::{CanteenOrder, CanteenOrderItem, MenuItem};
use crate::services::{access, Bind};
use crate::{CoreError, CoreResult, Identity};
use chrono::Utc;
use serde::Deserialize;
use sqlx::{Sqlite, SqlitePool, Transaction};
use tracing::info;
use utoipa::IntoParams;

#[derive(Debug, Default, Clone, Deserialize, IntoParams)]
#[serde(deny_unknown_fields)]
pub struct MenuFilter {
    pub category: Option<String>,
    /// Defaults to active items only
    pub include_inactive: Option<bool>,
}

#[derive(Debug, Default, Clone, Deserialize, IntoParams)]
#[serde(deny_unknown_fields)]
pub struct OrderFilter {
    pub status: Option<String>,
    pub patient_id: Option<i64>,
}

/// An order together with its line items.
#[derive(Debug, Clone, serde::Serialize, utoipa::ToSchema)]
pub struct OrderView {
    #[serde(flatten)]
    pub order: CanteenOrder,
    pub items: Vec<CanteenOrderItem>,
}

pub async fn list_menu(pool: &SqlitePool, filter: &MenuFilter) -> CoreResult<Vec<MenuItem>> {
    let mut sql = String::from("SELECT * FROM menu_item WHERE 1 = 1");
    let mut binds: Vec<String> = Vec::new();
    if !filter.include_inactive.unwrap_or(false) {
        sql.push_str(" AND is_active = 1");
    }
    if let Some(category) = filter.category.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
        binds.push(category.to_lowercase());
        sql.push_str(&format!(" AND LOWER(category) = ?{}", binds.len()));
    }
    sql.push_str(" ORDER BY name");

    let mut query = sqlx::query_as::<_, MenuItem>(&sql);
    for bind in &binds {
        query = query.bind(bind);
    }
    Ok(query.fetch_all(pool).await?)
}

/// Opens an empty order (total zero) for the caller.
pub async fn create_order(
    pool: &SqlitePool,
    identity: &Identity,
    patient_id: Option<i64>,
) -> CoreResult<OrderView> {
    let user = access::require_account(identity)?;
    if let Some(patient_id) = patient_id {
        access::authorize_patient(pool, identity, patient_id).await?;
    }

    let id = sqlx::query(
        "INSERT INTO canteen_order (user_id, patient_id, status, total_cents, created_at)
         VALUES (?1, ?2, 'pending', 0, ?3)",
    )
    .bind(user.id)
    .bind(patient_id)
    .bind(Utc::now())
    .execute(pool)
    .await?
    .last_insert_rowid();

    info!(order_id = id, "canteen order opened");
    order_view(pool, id).await
}

/// Adds a line item, capturing the menu item's current price, and persists a
/// freshly aggregated total. The whole sequence is one transaction.
pub async fn add_item(
    pool: &SqlitePool,
    identity: &Identity,
    order_id: i64,
    menu_item_id: i64,
    qty: i64,
) -> CoreResult<OrderView> {
    if qty <= 0 {
        return Err(CoreError::InvalidInput("qty must be positive.".into()));
    }

    let mut tx = pool.begin().await?;
    authorize_order(&mut tx, identity, order_id).await?;

    let menu_item = sqlx::query_as::<_, MenuItem>(
        "SELECT * FROM menu_item WHERE id = ?1 AND is_active = 1",
    )
    .bind(menu_item_id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(|| CoreError::NotFound("Menu item not found or inactive.".into()))?;

    sqlx::query(
        "INSERT INTO canteen_order_item (order_id, menu_item_id, qty, price_cents)
         VALUES (?1, ?2, ?3, ?4)",
    )
    .bind(order_id)
    .bind(menu_item_id)
    .bind(qty)
    .bind(menu_item.price_cents)
    .execute(&mut *tx)
    .await?;

    recompute_total(&mut tx, order_id).await?;
    tx.commit().await?;
    order_view(pool, order_id).await
}

/// Administrative line-item edit. The unit price is re-derived from the menu
/// unless `price_override_cents` is supplied; the total is recomputed once
/// after the edit.
pub async fn update_item(
    pool: &SqlitePool,
    identity: &Identity,
    order_id: i64,
    item_id: i64,
    qty: i64,
    price_override_cents: Option<i64>,
) -> CoreResult<OrderView> {
    access::require_staff(identity)?;
    if qty <= 0 {
        return Err(CoreError::InvalidInput("qty must be positive.".into()));
    }
    if price_override_cents.is_some_and(|p| p < 0) {
        return Err(CoreError::InvalidInput("price override cannot be negative.".into()));
    }

    let mut tx = pool.begin().await?;
    let item = sqlx::query_as::<_, CanteenOrderItem>(
        "SELECT * FROM canteen_order_item WHERE id = ?1 AND order_id = ?2",
    )
    .bind(item_id)
    .bind(order_id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(|| CoreError::NotFound("Order item not found.".into()))?;

    let price_cents = match price_override_cents {
        Some(cents) => cents,
        None => {
            sqlx::query_scalar::<_, i64>("SELECT price_cents FROM menu_item WHERE id = ?1")
                .bind(item.menu_item_id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or_else(|| CoreError::NotFound("Menu item not found.".into()))?
        }
    };

    sqlx::query("UPDATE canteen_order_item SET qty = ?1, price_cents = ?2 WHERE id = ?3")
        .bind(qty)
        .bind(price_cents)
        .bind(item_id)
        .execute(&mut *tx)
        .await?;

    recompute_total(&mut tx, order_id).await?;
    tx.commit().await?;
    order_view(pool, order_id).await
}

/// Removes a line item and recomputes the total.
pub async fn delete_item(
    pool: &SqlitePool,
    identity: &Identity,
    order_id: i64,
    item_id: i64,
) -> CoreResult<OrderView> {
    let mut tx = pool.begin().await?;
    authorize_order(&mut tx, identity, order_id).await?;

    let affected = sqlx::query("DELETE FROM canteen_order_item WHERE id = ?1 AND order_id = ?2")
        .bind(item_id)
        .bind(order_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();
    if affected == 0 {
        return Err(CoreError::NotFound("Order item not found.".into()));
    }

    recompute_total(&mut tx, order_id).await?;
    tx.commit().await?;
    order_view(pool, order_id).await
}

/// Parent order of a line item, for routes addressing items directly.
pub async fn item_order_id(pool: &SqlitePool, item_id: i64) -> CoreResult<i64> {
    sqlx::query_scalar("SELECT order_id FROM canteen_order_item WHERE id = ?1")
        .bind(item_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| CoreError::NotFound("Order item not found.".into()))
}

/// Marks an order paid. Staff only; paying twice is a no-op.
pub async fn mark_paid(pool: &SqlitePool, identity: &Identity, order_id: i64) -> CoreResult<OrderView> {
    access::require_staff(identity)?;
    let affected = sqlx::query(
        "UPDATE canteen_order SET status = 'paid', paid_at = ?1
         WHERE id = ?2 AND status <> 'paid'",
    )
    .bind(Utc::now())
    .bind(order_id)
    .execute(pool)
    .await?
    .rows_affected();
    if affected == 0 {
        // Either missing or already paid; the fetch disambiguates.
        let _ = fetch_order(pool, order_id).await?;
    }
    order_view(pool, order_id).await
}

pub async fn get_order(pool: &SqlitePool, identity: &Identity, order_id: i64) -> CoreResult<OrderView> {
    let order = fetch_order(pool, order_id).await?;
    match identity {
        Identity::Staff(_) => {}
        Identity::AppUser(user) if user.id == order.user_id => {}
        Identity::AppUser(_) | Identity::Anonymous => {
            return Err(CoreError::NotFound("Order not found.".into()))
        }
    }
    order_view(pool, order_id).await
}

/// Lists orders: staff see everything, AppUsers their own.
pub async fn list_orders(
    pool: &SqlitePool,
    identity: &Identity,
    filter: &OrderFilter,
) -> CoreResult<Vec<CanteenOrder>> {
    let mut sql = String::from("SELECT * FROM canteen_order WHERE 1 = 1");
    let mut binds: Vec<Bind> = Vec::new();

    match identity {
        Identity::Staff(_) => {}
        Identity::AppUser(user) => {
            binds.push(Bind::Int(user.id));
            sql.push_str(&format!(" AND user_id = ?{}", binds.len()));
        }
        Identity::Anonymous => return Ok(Vec::new()),
    }
    if let Some(status) = filter.status.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        binds.push(Bind::Text(status.to_lowercase()));
        sql.push_str(&format!(" AND LOWER(status) = ?{}", binds.len()));
    }
    if let Some(patient_id) = filter.patient_id {
        binds.push(Bind::Int(patient_id));
        sql.push_str(&format!(" AND patient_id = ?{}", binds.len()));
    }
    sql.push_str(" ORDER BY id DESC");

    let mut query = sqlx::query_as::<_, CanteenOrder>(&sql);
    for bind in binds {
        query = match bind {
            Bind::Text(text) => query.bind(text),
            Bind::Int(int) => query.bind(int),
            Bind::At(at) => query.bind(at),
        };
    }
    Ok(query.fetch_all(pool).await?)
}

/// Re-derives the order total from the full set of line items.
async fn recompute_total(tx: &mut Transaction<'_, Sqlite>, order_id: i64) -> CoreResult<()> {
    let total: i64 = sqlx::query_scalar(
        "SELECT COALESCE(SUM(qty * price_cents), 0) FROM canteen_order_item WHERE order_id = ?1",
    )
    .bind(order_id)
    .fetch_one(&mut **tx)
    .await?;

    sqlx::query("UPDATE canteen_order SET total_cents = ?1 WHERE id = ?2")
        .bind(total)
        .bind(order_id)
        .execute(&mut **tx)
        .await?;
    Ok(())
}

async fn authorize_order(
    tx: &mut Transaction<'_, Sqlite>,
    identity: &Identity,
    order_id: i64,
) -> CoreResult<()> {
    let owner: Option<i64> = sqlx::query_scalar("SELECT user_id FROM canteen_order WHERE id = ?1")
        .bind(order_id)
        .fetch_optional(&mut **tx)
        .await?;
    let Some(owner) = owner else {
        return Err(CoreError::NotFound("Order not found.".into()));
    };
    match identity {
        Identity::Staff(_) => Ok(()),
        Identity::AppUser(user) if user.id == owner => Ok(()),
        Identity::AppUser(_) => Err(CoreError::Forbidden("Not your order.".into())),
        Identity::Anonymous => Err(CoreError::Unauthorized("Authentication required.".into())),
    }
}

async fn fetch_order(pool: &SqlitePool, id: i64) -> CoreResult<CanteenOrder> {
    let order = sqlx::query_as::<_, CanteenOrder>("SELECT * FROM canteen_order WHERE id = ?1")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| CoreError::NotFound("Order not found.".into()))?;
    Ok(order)
}

async fn order_view(pool: &SqlitePool, id: i64) -> CoreResult<OrderView> {
    let order = fetch_order(pool, id).await?;
    let items = sqlx::query_as::<_, CanteenOrderItem>(
        "SELECT * FROM canteen_order_item WHERE order_id = ?1 ORDER BY id",
    )
    .bind(id)
    .fetch_all(pool)
    .await?;
    Ok(OrderView { order, items })
}
