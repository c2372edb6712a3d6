//! Order Model
//!
//! An order is a tenant-scoped aggregate: a header with derived financial
//! totals plus an ordered, non-empty set of lines. Lines snapshot the menu
//! item name and price at order time and are never reconciled independently.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Order lifecycle state. `Completed` and `Cancelled` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Completed,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "completed" => Some(Self::Completed),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }
}

/// Order aggregate root
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub table_id: Option<Uuid>,
    pub actor_id: String,
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub status: OrderStatus,
    pub subtotal: Decimal,
    pub discount_percentage: Decimal,
    pub service_charge_percentage: Decimal,
    pub tax_percentage: Decimal,
    /// Derived: always the pricing formula applied to lines + percentages
    pub total_amount: Decimal,
    pub payment_method: Option<String>,
    pub amount_paid: Option<Decimal>,
    pub created_at: i64,
    pub updated_at: i64,
    pub lines: Vec<OrderLine>,
}

/// One order line, owned exclusively by its order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderLine {
    pub id: i64,
    pub order_id: Uuid,
    pub menu_item_id: Uuid,
    /// Name snapshot at order time
    pub name: String,
    /// Price snapshot at order time
    pub price: Decimal,
    pub quantity: i64,
    pub modifiers: Vec<String>,
}

/// Line input for order creation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderLineInput {
    pub menu_item_id: Uuid,
    pub name: String,
    pub price: Decimal,
    pub quantity: i64,
    #[serde(default)]
    pub modifiers: Vec<String>,
}

/// Order creation payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOrder {
    #[serde(default)]
    pub table_id: Option<Uuid>,
    #[serde(default)]
    pub customer_name: Option<String>,
    #[serde(default)]
    pub customer_phone: Option<String>,
    pub lines: Vec<OrderLineInput>,
    #[serde(default)]
    pub discount_percentage: Decimal,
    #[serde(default)]
    pub service_charge_percentage: Decimal,
    #[serde(default)]
    pub tax_percentage: Decimal,
}
