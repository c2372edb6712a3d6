//! Shared types for the Comanda backend
//!
//! Common types used across crates: data models, the sync wire protocol,
//! broadcast event shapes, the unified error system, and time utilities.

pub mod error;
pub mod message;
pub mod models;
pub mod sync;
pub mod util;

// Re-exports
pub use axum::Json;
pub use http;
pub use serde::{Deserialize, Serialize};
