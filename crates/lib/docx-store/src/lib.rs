//! Storage records and schema helpers for docx-mcp.
//!
//! This crate defines the persisted metadata shared by the control plane,
//! the storage backend and the API surfaces. Document bodies are not stored
//! here; records point at blobs by name.

pub mod models;
pub mod schema;

pub use models::*;
