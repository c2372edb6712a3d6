//! Broadcast event shape
//!
//! Events are fire-and-forget: delivered to sessions subscribed to the
//! tenant's channel at publish time, with no persistence or replay.
//! Disconnected clients catch up through the sync ledger instead.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One real-time event on a tenant channel
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TenantEvent {
    /// e.g. "table-updated", "order-created"
    pub event_type: String,
    pub tenant: Uuid,
    pub payload: serde_json::Value,
}
