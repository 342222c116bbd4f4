use std::future::Future;

use surrealdb::Connection;
use tokio::sync::OwnedMutexGuard;
use tracing::{debug, warn};

use crate::document::WordDocument;
use crate::parsers::DocxParser;
use crate::render;
use crate::services::SharedDocument;

use super::documents::refresh_content;
use super::{ControlError, DocxControlPlane};

/// Exclusive hold on an open document.
pub type DocumentGuard = OwnedMutexGuard<WordDocument>;

impl<C: Connection> DocxControlPlane<C> {
    /// Returns the parsed document, loading it into the cache on first use.
    ///
    /// # Errors
    /// Returns `ControlError::NotFound` for an unknown document,
    /// `ControlError::Cache` when the cache is full and `ControlError::Parse`
    /// when the stored package cannot be read.
    pub async fn open_document(&self, document_id: &str) -> Result<SharedDocument, ControlError> {
        self.cache
            .get_or_load(document_id, || async move {
                let record = self.require_document(document_id).await?;
                let bytes = self.blobs.get(&record.file_name).await?;
                debug!(document_id, size = bytes.len(), "loading document into cache");
                Ok(DocxParser::parse_async(bytes).await?)
            })
            .await
    }

    /// Locks the cached copy of a document. If the copy left the cache while
    /// the lock was awaited, the current one is opened and locked instead.
    ///
    /// # Errors
    /// Same as [`DocxControlPlane::open_document`].
    pub async fn lock_document(&self, document_id: &str) -> Result<DocumentGuard, ControlError> {
        loop {
            let shared = self.open_document(document_id).await?;
            let guard = shared.clone().lock_owned().await;
            if self.cache.is_current(document_id, &shared).await {
                return Ok(guard);
            }
            debug!(document_id, "cached document replaced while waiting for its lock");
        }
    }

    /// Runs a read-only operation against the document.
    ///
    /// # Errors
    /// Returns the operation's error or any error from opening the document.
    pub async fn read<T, E, F>(&self, document_id: &str, operation: F) -> Result<T, ControlError>
    where
        F: FnOnce(&WordDocument) -> Result<T, E>,
        ControlError: From<E>,
    {
        let doc = self.lock_document(document_id).await?;
        Ok(operation(&doc)?)
    }

    /// Applies an operation and saves the result as the working copy. When
    /// the operation or the save fails the document is restored to its state
    /// before the call. Once the operation has run, the save completes even
    /// if the caller stops waiting.
    ///
    /// # Errors
    /// Returns the operation's error, or `ControlError` if the package cannot
    /// be written or stored.
    pub async fn edit<T, E, F>(&self, document_id: &str, operation: F) -> Result<T, ControlError>
    where
        F: FnOnce(&mut WordDocument) -> Result<T, E>,
        ControlError: From<E>,
    {
        let mut doc = self.lock_document(document_id).await?;
        let snapshot = doc.clone();
        let value = match operation(&mut doc) {
            Ok(value) => value,
            Err(err) => {
                *doc = snapshot;
                return Err(err.into());
            }
        };
        self.persist(document_id, doc, snapshot).await?;
        Ok(value)
    }

    /// Saves an edited document on its own task and releases the lock when
    /// done. A failed save restores `snapshot`.
    pub(crate) async fn persist(
        &self,
        document_id: &str,
        mut doc: DocumentGuard,
        snapshot: WordDocument,
    ) -> Result<(), ControlError> {
        let plane = self.clone();
        let document_id = document_id.to_string();
        detached(async move {
            let saved = plane.save(&document_id, &doc).await;
            if saved.is_err() {
                *doc = snapshot;
            }
            saved
        })
        .await
    }

    /// Writes the record first and the package second. A failed package
    /// write puts the previous record back.
    pub(crate) async fn save(&self, document_id: &str, doc: &WordDocument) -> Result<(), ControlError> {
        let bytes = render::docx::write(doc)?;
        self.check_size(bytes.len())?;
        let previous = self.require_document(document_id).await?;
        let mut record = previous.clone();
        refresh_content(&mut record, bytes.len(), doc);
        self.store.update_document(record).await?;
        if let Err(err) = self.blobs.put(&previous.file_name, &bytes).await {
            if let Err(restore) = self.store.update_document(previous).await {
                warn!(document_id, error = %restore, "failed to restore document record");
            }
            return Err(err.into());
        }
        debug!(document_id, size = bytes.len(), "document saved");
        Ok(())
    }
}

/// Runs `task` to completion on its own Tokio task, so dropping the caller
/// does not stop it half way.
pub(crate) async fn detached<T, F>(task: F) -> Result<T, ControlError>
where
    F: Future<Output = Result<T, ControlError>> + Send + 'static,
    T: Send + 'static,
{
    tokio::spawn(task)
        .await
        .map_err(|err| ControlError::Interrupted(err.to_string()))?
}
