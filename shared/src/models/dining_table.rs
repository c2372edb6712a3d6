//! Dining Table Model

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Dining table entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiningTable {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub name: String,
    pub seats: i64,
    pub description: Option<String>,
    pub version: i64,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Dining table field set for inserts and updates.
///
/// Every settable field is listed explicitly; absent fields are left
/// unchanged on update and fall back to defaults on insert. Unknown keys
/// are rejected at deserialization.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DiningTablePatch {
    pub name: Option<String>,
    pub seats: Option<i64>,
    pub description: Option<String>,
}
