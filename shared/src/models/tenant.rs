//! Tenant Model

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The isolation boundary for one restaurant's data.
///
/// Created once at registration and never merged with another tenant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tenant {
    pub id: Uuid,
    pub name: String,
    pub created_at: i64,
}
