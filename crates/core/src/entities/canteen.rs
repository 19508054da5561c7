//! Canteen ordering rows: menu items, orders, order line items.
//!
//! Money is integer minor-currency units (`*_cents`) throughout. The order
//! total is derived state: `canteen_order.total_cents` must equal the sum of
//! `qty * price_cents` over the order's line items after every mutation, and
//! is always recomputed from the persisted items rather than adjusted
//! incrementally.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Read-only menu reference for line items.
#[derive(Clone, Debug, PartialEq, sqlx::FromRow, Serialize, Deserialize, ToSchema)]
pub struct MenuItem {
    pub id: i64,
    pub name: String,
    pub category: String,
    /// Current price in minor currency units
    pub price_cents: i64,
    pub is_active: bool,
}

/// One canteen order; owns its line items exclusively.
#[derive(Clone, Debug, PartialEq, sqlx::FromRow, Serialize, Deserialize, ToSchema)]
pub struct CanteenOrder {
    pub id: i64,
    pub user_id: i64,
    pub patient_id: Option<i64>,
    /// pending / paid / ...
    pub status: String,
    /// Derived: Σ(item.qty × item.price_cents) over attached items
    pub total_cents: i64,
    pub created_at: DateTime<Utc>,
    pub paid_at: Option<DateTime<Utc>>,
}

/// One menu-item-and-quantity entry within an order.
///
/// `price_cents` is captured from the menu item at creation time and is
/// immutable afterwards regardless of later menu price changes (the
/// administrative override path excepted).
#[derive(Clone, Debug, PartialEq, sqlx::FromRow, Serialize, Deserialize, ToSchema)]
pub struct CanteenOrderItem {
    pub id: i64,
    pub order_id: i64,
    pub menu_item_id: i64,
    pub qty: i64,
    /// Unit price captured at item-creation time
    pub price_cents: i64,
}
