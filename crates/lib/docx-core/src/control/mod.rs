use std::{error::Error, fmt};

use chrono::{SecondsFormat, Utc};
use docx_store::models::{AuditAction, AuditRecord};
use serde_json::Value;
use surrealdb::Connection;
use tracing::warn;

use crate::editor::DocumentError;
use crate::parsers::DocxParseError;
use crate::render::RenderError;
use crate::services::{CacheError, DocumentCache, DocumentCacheConfig, ExportQueue, JobError};
use crate::store::{BlobStore, StoreError, SurrealDocStore};

pub mod audit;
pub mod batch;
pub mod comments;
pub mod documents;
pub mod editing;
pub mod exports;
pub mod revisions;
pub mod templates;
pub mod versions;

pub use batch::{BatchRequest, BatchResult, BatchStep, BatchValidation};
pub use comments::{AddCommentRequest, CommentFilter, CommentUpdate};
pub use documents::{CreateDocumentRequest, DocumentPage, DocumentUpdate};
pub use editing::DocumentGuard;
pub use exports::{ExportFormatInfo, ExportOutput, export_formats};
pub use revisions::{ProposeRevisionRequest, RevisionBatch};
pub use templates::CreateTemplateRequest;
pub use versions::VersionComparison;

/// Default cap on uploaded or generated `.docx` packages.
pub const DEFAULT_MAX_DOCUMENT_BYTES: usize = 50 * 1024 * 1024;

#[derive(Debug)]
pub enum ControlError {
    NotFound(String),
    InvalidInput(String),
    Conflict(String),
    Document(DocumentError),
    Parse(DocxParseError),
    Render(RenderError),
    Store(StoreError),
    Cache(CacheError),
    Job(JobError),
    /// A detached save task panicked or was cancelled.
    Interrupted(String),
}

impl fmt::Display for ControlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound(message) | Self::InvalidInput(message) | Self::Conflict(message) => {
                f.write_str(message)
            }
            Self::Interrupted(message) => write!(f, "document save interrupted: {message}"),
            Self::Document(err) => write!(f, "{err}"),
            Self::Parse(err) => write!(f, "{err}"),
            Self::Render(err) => write!(f, "{err}"),
            Self::Store(err) => write!(f, "{err}"),
            Self::Cache(err) => write!(f, "{err}"),
            Self::Job(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ControlError {}

impl ControlError {
    pub(crate) fn not_found(kind: &str, id: impl fmt::Display) -> Self {
        Self::NotFound(format!("{kind} not found: {id}"))
    }

    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    /// Whether the failure was caused by the caller's input rather than the
    /// service.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        match self {
            Self::InvalidInput(_) | Self::Parse(_) => true,
            Self::Document(err) => !matches!(err, DocumentError::NotFound(_)),
            Self::Render(err) => matches!(err, RenderError::UnsupportedFormat(_)),
            Self::Store(err) => matches!(err, StoreError::InvalidInput(_)),
            _ => false,
        }
    }

    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::NotFound(_) | Self::Document(DocumentError::NotFound(_))
        )
    }
}

impl From<DocumentError> for ControlError {
    fn from(err: DocumentError) -> Self {
        Self::Document(err)
    }
}

impl From<DocxParseError> for ControlError {
    fn from(err: DocxParseError) -> Self {
        Self::Parse(err)
    }
}

impl From<RenderError> for ControlError {
    fn from(err: RenderError) -> Self {
        Self::Render(err)
    }
}

impl From<StoreError> for ControlError {
    fn from(err: StoreError) -> Self {
        Self::Store(err)
    }
}

impl From<CacheError> for ControlError {
    fn from(err: CacheError) -> Self {
        Self::Cache(err)
    }
}

impl From<JobError> for ControlError {
    fn from(err: JobError) -> Self {
        Self::Job(err)
    }
}

pub struct DocxControlPlane<C: Connection> {
    store: SurrealDocStore<C>,
    blobs: BlobStore,
    cache: DocumentCache,
    exports: Option<ExportQueue>,
    max_document_bytes: usize,
}

impl<C: Connection> Clone for DocxControlPlane<C> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            blobs: self.blobs.clone(),
            cache: self.cache.clone(),
            exports: self.exports.clone(),
            max_document_bytes: self.max_document_bytes,
        }
    }
}

impl<C: Connection> DocxControlPlane<C> {
    /// Builds a control plane with an unbounded cache and no export workers.
    #[must_use]
    pub fn new(store: SurrealDocStore<C>, blobs: BlobStore) -> Self {
        Self {
            store,
            blobs,
            cache: DocumentCache::new(DocumentCacheConfig::default()),
            exports: None,
            max_document_bytes: DEFAULT_MAX_DOCUMENT_BYTES,
        }
    }

    #[must_use]
    pub fn with_cache(mut self, config: DocumentCacheConfig) -> Self {
        self.cache = DocumentCache::new(config);
        self
    }

    #[must_use]
    pub const fn with_max_document_bytes(mut self, max_document_bytes: usize) -> Self {
        self.max_document_bytes = max_document_bytes;
        self
    }

    #[must_use]
    pub const fn store(&self) -> &SurrealDocStore<C> {
        &self.store
    }

    #[must_use]
    pub const fn blobs(&self) -> &BlobStore {
        &self.blobs
    }

    #[must_use]
    pub const fn cache(&self) -> &DocumentCache {
        &self.cache
    }

    #[must_use]
    pub const fn max_document_bytes(&self) -> usize {
        self.max_document_bytes
    }

    pub(crate) fn check_size(&self, len: usize) -> Result<(), ControlError> {
        if len > self.max_document_bytes {
            return Err(ControlError::invalid(format!(
                "Document exceeds the maximum size of {} bytes",
                self.max_document_bytes
            )));
        }
        Ok(())
    }

    /// Writes an audit entry. Failures are logged and not returned.
    pub(crate) async fn audit(
        &self,
        action: AuditAction,
        resource_type: &str,
        resource_id: &str,
        details: Option<Value>,
    ) {
        let entry = AuditRecord {
            id: None,
            action,
            resource_type: resource_type.to_string(),
            resource_id: resource_id.to_string(),
            details,
            created_at: timestamp(),
        };
        if let Err(err) = self.store.create_audit(entry).await {
            warn!(resource_id, error = %err, "failed to write audit entry");
        }
    }
}

/// Current time as an RFC 3339 UTC string. Fixed precision keeps stored
/// timestamps ordering correctly as strings.
pub(crate) fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Trims an optional string, mapping blank values to `None`.
pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
