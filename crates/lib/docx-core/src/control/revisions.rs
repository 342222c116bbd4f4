use docx_store::models::{
    AuditAction,
    DocumentRecord,
    RevisionAction,
    RevisionRecord,
    RevisionStatus,
};
use docx_store::schema::{RESOURCE_DOCUMENT, RESOURCE_REVISION};
use serde::{Deserialize, Serialize};
use serde_json::json;
use surrealdb::Connection;
use tracing::warn;

use crate::document::WordDocument;
use crate::editor::{DocumentResult, ParagraphUpdate, TextFormat};

use super::editing::detached;
use super::{ControlError, DocxControlPlane, new_id, non_blank, timestamp};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProposeRevisionRequest {
    pub action: RevisionAction,
    pub paragraph_index: usize,
    #[serde(default)]
    pub content: Option<String>,
    pub author: String,
}

/// Outcome of accepting or rejecting every pending revision.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RevisionBatch {
    pub processed: Vec<String>,
    pub failed: Vec<RevisionFailure>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RevisionFailure {
    pub revision_id: String,
    pub error: String,
}

impl<C: Connection> DocxControlPlane<C> {
    /// Turns change tracking on or off.
    ///
    /// # Errors
    /// Returns `ControlError::NotFound` for an unknown document.
    pub async fn set_tracking(&self, document_id: &str, enabled: bool) -> Result<DocumentRecord, ControlError> {
        let mut record = self.require_document(document_id).await?;
        record.tracking_enabled = enabled;
        record.updated_at = timestamp();
        let record = self.store.update_document(record).await?;
        self.audit(
            AuditAction::Update,
            RESOURCE_DOCUMENT,
            document_id,
            Some(json!({ "tracking_enabled": enabled })),
        )
        .await;
        Ok(record)
    }

    /// Records a proposed change without touching the document.
    ///
    /// # Errors
    /// Returns `ControlError::Conflict` when tracking is off,
    /// `ControlError::InvalidInput` for missing content and
    /// `ControlError::Document` for an unknown paragraph.
    pub async fn propose_revision(
        &self,
        document_id: &str,
        request: ProposeRevisionRequest,
    ) -> Result<RevisionRecord, ControlError> {
        let ProposeRevisionRequest {
            action,
            paragraph_index,
            content,
            author,
        } = request;
        let author = non_blank(Some(author)).ok_or_else(|| ControlError::invalid("author is required"))?;
        let record = self.require_document(document_id).await?;
        if !record.tracking_enabled {
            return Err(ControlError::Conflict(format!(
                "Change tracking is not enabled for document {document_id}"
            )));
        }
        let content = content.filter(|content| !content.is_empty());
        if matches!(action, RevisionAction::Insert | RevisionAction::Replace) && content.is_none() {
            return Err(ControlError::invalid(format!(
                "content is required for {action} revisions"
            )));
        }
        let original = self
            .read(document_id, |doc| doc.paragraph(paragraph_index).map(|paragraph| paragraph.text()))
            .await?;

        let revision = self
            .store
            .create_revision(RevisionRecord {
                id: None,
                revision_id: new_id(),
                document_id: document_id.to_string(),
                author,
                action,
                paragraph_index,
                original_content: Some(original),
                new_content: content,
                status: RevisionStatus::Pending,
                created_at: timestamp(),
                decided_at: None,
                decided_by: None,
            })
            .await?;
        self.audit(
            AuditAction::Create,
            RESOURCE_REVISION,
            &revision.revision_id,
            Some(json!({ "document_id": document_id, "action": action })),
        )
        .await;
        Ok(revision)
    }

    /// # Errors
    /// Returns `ControlError::NotFound` for an unknown document.
    pub async fn list_revisions(
        &self,
        document_id: &str,
        pending_only: bool,
    ) -> Result<Vec<RevisionRecord>, ControlError> {
        self.require_document(document_id).await?;
        let status = pending_only.then_some(RevisionStatus::Pending);
        Ok(self.store.list_revisions(document_id, status).await?)
    }

    /// # Errors
    /// Returns `ControlError::NotFound` unless the revision belongs to the document.
    pub async fn get_revision(
        &self,
        document_id: &str,
        revision_id: &str,
    ) -> Result<RevisionRecord, ControlError> {
        self.store
            .get_revision(revision_id)
            .await?
            .filter(|revision| revision.document_id == document_id)
            .ok_or_else(|| ControlError::not_found("Revision", revision_id))
    }

    /// Applies a pending revision to the document.
    ///
    /// # Errors
    /// Returns `ControlError::Conflict` when the revision was already decided.
    pub async fn accept_revision(
        &self,
        document_id: &str,
        revision_id: &str,
        decided_by: Option<String>,
    ) -> Result<RevisionRecord, ControlError> {
        self.decide(document_id, revision_id, RevisionStatus::Accepted, decided_by)
            .await
    }

    /// # Errors
    /// Returns `ControlError::Conflict` when the revision was already decided.
    pub async fn reject_revision(
        &self,
        document_id: &str,
        revision_id: &str,
        decided_by: Option<String>,
    ) -> Result<RevisionRecord, ControlError> {
        self.decide(document_id, revision_id, RevisionStatus::Rejected, decided_by)
            .await
    }

    /// Decides a revision while holding the document lock, so a concurrent
    /// decision on the same revision sees the new status and fails.
    async fn decide(
        &self,
        document_id: &str,
        revision_id: &str,
        outcome: RevisionStatus,
        decided_by: Option<String>,
    ) -> Result<RevisionRecord, ControlError> {
        let mut doc = self.lock_document(document_id).await?;
        let mut revision = self.get_revision(document_id, revision_id).await?;
        if revision.status != RevisionStatus::Pending {
            return Err(ControlError::Conflict(format!(
                "Revision {revision_id} has already been {}",
                revision.status
            )));
        }
        let snapshot = if outcome == RevisionStatus::Accepted {
            let snapshot = doc.clone();
            if let Err(err) = apply_revision(&mut doc, &revision) {
                *doc = snapshot;
                return Err(err.into());
            }
            Some(snapshot)
        } else {
            None
        };
        revision.status = outcome;
        revision.decided_at = Some(timestamp());
        revision.decided_by = non_blank(decided_by);

        let plane = self.clone();
        let owned_id = document_id.to_string();
        let revision = detached(async move {
            let Some(snapshot) = snapshot else {
                return Ok(plane.store.update_revision(revision).await?);
            };
            if let Err(err) = plane.save(&owned_id, &doc).await {
                *doc = snapshot;
                return Err(err);
            }
            match plane.store.update_revision(revision).await {
                Ok(revision) => Ok(revision),
                Err(err) => {
                    *doc = snapshot;
                    if let Err(restore) = plane.save(&owned_id, &doc).await {
                        warn!(document_id = %owned_id, error = %restore, "failed to undo applied revision");
                    }
                    Err(err.into())
                }
            }
        })
        .await?;
        self.audit(
            AuditAction::Update,
            RESOURCE_REVISION,
            revision_id,
            Some(json!({ "document_id": document_id, "status": outcome })),
        )
        .await;
        Ok(revision)
    }

    /// Accepts every pending revision, oldest first.
    ///
    /// # Errors
    /// Returns `ControlError::NotFound` for an unknown document.
    pub async fn accept_all_revisions(
        &self,
        document_id: &str,
        decided_by: Option<String>,
    ) -> Result<RevisionBatch, ControlError> {
        self.decide_all(document_id, RevisionStatus::Accepted, decided_by)
            .await
    }

    /// # Errors
    /// Returns `ControlError::NotFound` for an unknown document.
    pub async fn reject_all_revisions(
        &self,
        document_id: &str,
        decided_by: Option<String>,
    ) -> Result<RevisionBatch, ControlError> {
        self.decide_all(document_id, RevisionStatus::Rejected, decided_by)
            .await
    }

    async fn decide_all(
        &self,
        document_id: &str,
        outcome: RevisionStatus,
        decided_by: Option<String>,
    ) -> Result<RevisionBatch, ControlError> {
        let pending = self.list_revisions(document_id, true).await?;
        let mut batch = RevisionBatch::default();
        for revision in pending {
            match self
                .decide(document_id, &revision.revision_id, outcome, decided_by.clone())
                .await
            {
                Ok(_) => batch.processed.push(revision.revision_id),
                Err(err) => {
                    warn!(revision_id = %revision.revision_id, error = %err, "revision could not be decided");
                    batch.failed.push(RevisionFailure {
                        revision_id: revision.revision_id,
                        error: err.to_string(),
                    });
                }
            }
        }
        Ok(batch)
    }
}

fn apply_revision(doc: &mut WordDocument, revision: &RevisionRecord) -> DocumentResult<()> {
    let paragraph_index = revision.paragraph_index;
    let content = revision.new_content.clone().unwrap_or_default();
    match revision.action {
        RevisionAction::Insert => {
            doc.add_run(paragraph_index, &content, &TextFormat::default())?;
        }
        RevisionAction::Delete => {
            let update = ParagraphUpdate {
                text: Some(String::new()),
                ..ParagraphUpdate::default()
            };
            doc.update_paragraph(paragraph_index, &update)?;
        }
        RevisionAction::Replace => {
            let update = ParagraphUpdate {
                text: Some(content),
                ..ParagraphUpdate::default()
            };
            doc.update_paragraph(paragraph_index, &update)?;
        }
        RevisionAction::Format => {}
    }
    Ok(())
}
