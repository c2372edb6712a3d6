//! Menu Item Model

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Menu item entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MenuItem {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub name: String,
    /// Unit price, fixed-point decimal
    pub price: Decimal,
    pub description: Option<String>,
    pub is_active: bool,
    pub stock_quantity: i64,
    pub version: i64,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Menu item field set for inserts and updates
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MenuItemPatch {
    pub name: Option<String>,
    pub price: Option<Decimal>,
    pub description: Option<String>,
    pub is_active: Option<bool>,
    pub stock_quantity: Option<i64>,
}
