//! Long-lived services shared by the control plane: the open-document cache
//! and the background export queue.

pub mod cache;
pub mod jobs;

pub use cache::{CacheError, DocumentCache, DocumentCacheConfig, SharedDocument};
pub use jobs::{ExportHandler, ExportQueue, ExportQueueConfig, ExportTask, JobError};
