//! Persistence: `SurrealDB` for metadata records, a flat directory for the
//! `.docx` bytes they point at.

pub mod blobs;
pub mod surreal;

pub use blobs::BlobStore;
pub use surreal::{DocumentQuery, StoreError, StoreResult, SurrealDocStore};
