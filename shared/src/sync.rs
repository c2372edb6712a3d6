//! Reconciliation wire protocol
//!
//! A client submits its offline mutation queue together with the timestamp
//! of the last ledger entry it has observed, and receives one result per
//! proposed change plus every ledger entry newer than that checkpoint.
//! Envelope keys are camelCase on the wire.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{
    CustomerPatch, DiningTablePatch, EntityKind, LedgerEntry, MenuItemPatch, Operation,
};

/// One client-proposed mutation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposedChange {
    pub kind: EntityKind,
    pub id: Uuid,
    pub operation: Operation,
    /// Domain fields for INSERT/UPDATE; ignored for DELETE
    #[serde(default)]
    pub fields: Option<serde_json::Value>,
    /// The entity version the client last observed. Required for
    /// UPDATE/DELETE; meaningless for INSERT.
    #[serde(default)]
    pub client_version: Option<i64>,
}

/// Typed per-kind field set, dispatched from the wire `kind` discriminant.
///
/// Field maps from clients never reach SQL directly: each kind has a fixed
/// whitelist struct and a fixed statement in the store.
#[derive(Debug, Clone)]
pub enum EntityPatch {
    Table(DiningTablePatch),
    MenuItem(MenuItemPatch),
    Customer(CustomerPatch),
}

impl EntityPatch {
    /// Parse raw wire fields into the typed patch for `kind`
    pub fn from_value(
        kind: EntityKind,
        value: serde_json::Value,
    ) -> Result<Self, serde_json::Error> {
        Ok(match kind {
            EntityKind::Table => Self::Table(serde_json::from_value(value)?),
            EntityKind::MenuItem => Self::MenuItem(serde_json::from_value(value)?),
            EntityKind::Customer => Self::Customer(serde_json::from_value(value)?),
        })
    }
}

/// Per-change outcome status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeStatus {
    Success,
    Conflict,
    Error,
}

/// Result of applying one proposed change
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeResult {
    pub id: Uuid,
    pub status: ChangeStatus,
    /// On success: the version after applying. On conflict: the version the
    /// server currently holds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server_version: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_version: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ChangeResult {
    pub fn success(id: Uuid, version: i64) -> Self {
        Self {
            id,
            status: ChangeStatus::Success,
            server_version: Some(version),
            client_version: None,
            error: None,
        }
    }

    pub fn conflict(id: Uuid, server_version: i64, client_version: i64) -> Self {
        Self {
            id,
            status: ChangeStatus::Conflict,
            server_version: Some(server_version),
            client_version: Some(client_version),
            error: None,
        }
    }

    pub fn error(id: Uuid, message: impl Into<String>) -> Self {
        Self {
            id,
            status: ChangeStatus::Error,
            server_version: None,
            client_version: None,
            error: Some(message.into()),
        }
    }
}

/// Sync exchange request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncRequest {
    /// Client checkpoint: commit timestamp of the last observed ledger
    /// entry, in UTC millis. Absent means "from the beginning".
    #[serde(default)]
    pub last_sync_time: Option<i64>,
    #[serde(default)]
    pub proposed_changes: Vec<ProposedChange>,
}

/// Sync exchange response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncResponse {
    pub results: Vec<ChangeResult>,
    /// Ledger entries strictly newer than the request checkpoint, ascending
    /// by commit order. Includes the client's own just-applied changes.
    pub server_changes: Vec<LedgerEntry>,
    /// Server-authoritative time for the client's next checkpoint
    pub sync_time: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn patch_dispatch_follows_kind() {
        let patch = EntityPatch::from_value(EntityKind::Table, json!({"seats": 6})).unwrap();
        match patch {
            EntityPatch::Table(t) => assert_eq!(t.seats, Some(6)),
            other => panic!("Expected table patch, got {other:?}"),
        }

        let patch =
            EntityPatch::from_value(EntityKind::Customer, json!({"loyalty_points": 10})).unwrap();
        assert!(matches!(patch, EntityPatch::Customer(_)));
    }

    #[test]
    fn patch_rejects_unknown_fields() {
        let result = EntityPatch::from_value(EntityKind::Table, json!({"version": 99}));
        assert!(result.is_err());

        let result = EntityPatch::from_value(EntityKind::MenuItem, json!({"tenant_id": "x"}));
        assert!(result.is_err());
    }

    #[test]
    fn envelope_keys_are_camel_case() {
        let req: SyncRequest = serde_json::from_value(json!({
            "lastSyncTime": 1000,
            "proposedChanges": [{
                "kind": "table",
                "id": "6a3a2b0a-8a63-4dbb-9f39-9f6f0e6ed1ce",
                "operation": "UPDATE",
                "fields": {"name": "T1"},
                "clientVersion": 2
            }]
        }))
        .unwrap();

        assert_eq!(req.last_sync_time, Some(1000));
        assert_eq!(req.proposed_changes.len(), 1);
        assert_eq!(req.proposed_changes[0].client_version, Some(2));
        assert_eq!(req.proposed_changes[0].operation, Operation::Update);

        let result = ChangeResult::conflict(req.proposed_changes[0].id, 3, 2);
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["status"], "conflict");
        assert_eq!(value["serverVersion"], 3);
        assert_eq!(value["clientVersion"], 2);
    }
}
