//! comanda-server: multi-tenant order-management backend
//!
//! The core is the synchronization and conflict-resolution engine: a
//! versioned entity store with optimistic concurrency, an append-only
//! change ledger used as a catch-up feed, a transactional order write
//! path, and per-tenant real-time fan-out.

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod live;
pub mod state;
pub mod sync;
