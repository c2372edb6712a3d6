//! Change ledger types
//!
//! Every committed mutation appends exactly one [`LedgerEntry`]. The ledger
//! is append-only and is the sole catch-up mechanism for clients that were
//! disconnected when a change was broadcast.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Ledger entity-kind string for order mutations.
///
/// Orders are written by the order transaction processor, not reconciled
/// per-field, so they are not an [`EntityKind`] variant.
pub const ORDERS_KIND: &str = "orders";

/// Mutation operation kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Operation {
    Insert,
    Update,
    Delete,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Insert => "INSERT",
            Self::Update => "UPDATE",
            Self::Delete => "DELETE",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "INSERT" => Some(Self::Insert),
            "UPDATE" => Some(Self::Update),
            "DELETE" => Some(Self::Delete),
            _ => None,
        }
    }
}

/// The mutable reference-entity kinds reconciled through the conflict
/// resolver. Orders have their own write path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Table,
    MenuItem,
    Customer,
}

impl EntityKind {
    /// Storage table name; doubles as the ledger `entity_kind` string
    pub fn table_name(&self) -> &'static str {
        match self {
            Self::Table => "dining_tables",
            Self::MenuItem => "menu_items",
            Self::Customer => "customers",
        }
    }

    /// Prefix for broadcast event types ("table-updated" etc.)
    pub fn event_prefix(&self) -> &'static str {
        match self {
            Self::Table => "table",
            Self::MenuItem => "menu-item",
            Self::Customer => "customer",
        }
    }
}

/// Immutable record of one committed mutation.
///
/// Total order within a tenant is `(committed_at, id)`: the autoincrement
/// row id breaks commit-timestamp ties.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: i64,
    pub tenant_id: Uuid,
    pub entity_kind: String,
    pub entity_id: Uuid,
    pub operation: Operation,
    pub actor_id: String,
    pub committed_at: i64,
}
