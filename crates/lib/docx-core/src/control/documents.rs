use docx_store::models::{AuditAction, DocumentRecord, DocumentStatus};
use docx_store::schema::{self, RESOURCE_DOCUMENT};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use surrealdb::Connection;
use tracing::info;

use crate::document::WordDocument;
use crate::parsers::DocxParser;
use crate::render;
use crate::store::DocumentQuery;

use super::{ControlError, DocxControlPlane, new_id, non_blank, timestamp};

const MAX_TITLE_CHARS: usize = 255;

/// Input for creating a document. At most one of `template_id` and
/// `content` may be set; with neither the document starts blank.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateDocumentRequest {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub template_id: Option<String>,
    /// Raw `.docx` bytes of an uploaded package.
    #[serde(skip)]
    pub content: Option<Vec<u8>>,
    #[serde(default)]
    pub owner: Option<String>,
    #[serde(default)]
    pub metadata: Option<Value>,
    #[serde(default)]
    pub tracking_enabled: bool,
}

/// Partial update of document metadata. `metadata` keys are merged into the
/// stored object.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentUpdate {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: Option<DocumentStatus>,
    #[serde(default)]
    pub metadata: Option<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentPage {
    pub items: Vec<DocumentRecord>,
    pub total: usize,
    pub skip: usize,
    pub limit: usize,
}

fn validate_title(title: &str) -> Result<String, ControlError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(ControlError::invalid("title is required"));
    }
    if title.chars().count() > MAX_TITLE_CHARS {
        return Err(ControlError::invalid(format!(
            "title must be at most {MAX_TITLE_CHARS} characters"
        )));
    }
    Ok(title.to_string())
}

fn validate_metadata(metadata: Option<&Value>) -> Result<(), ControlError> {
    match metadata {
        None | Some(Value::Object(_)) => Ok(()),
        Some(_) => Err(ControlError::invalid("metadata must be a JSON object")),
    }
}

fn merge_metadata(existing: Option<Value>, patch: Value) -> Option<Value> {
    match (existing, patch) {
        (Some(Value::Object(mut current)), Value::Object(patch)) => {
            for (key, value) in patch {
                if value.is_null() {
                    current.remove(&key);
                } else {
                    current.insert(key, value);
                }
            }
            Some(Value::Object(current))
        }
        (_, Value::Object(patch)) => Some(Value::Object(
            patch.into_iter().filter(|(_, value)| !value.is_null()).collect(),
        )),
        (existing, _) => existing,
    }
}

/// Lower-cased body text stored for searching.
pub(crate) fn search_text(doc: &WordDocument) -> String {
    doc.all_text().to_lowercase()
}

/// Updates the content-derived fields of a record after a write.
pub(crate) fn refresh_content(record: &mut DocumentRecord, file_size: usize, doc: &WordDocument) {
    record.file_size = file_size as u64;
    record.search_text = search_text(doc);
    record.updated_at = timestamp();
}

impl<C: Connection> DocxControlPlane<C> {
    /// Creates a document from scratch, a template or an uploaded package.
    /// The initial content is snapshotted as version 1.
    ///
    /// # Errors
    /// Returns `ControlError::InvalidInput` for a bad title, conflicting
    /// sources or an oversized upload, `ControlError::Parse` for an invalid
    /// package and `ControlError::NotFound` for an unknown template.
    pub async fn create_document(
        &self,
        request: CreateDocumentRequest,
    ) -> Result<DocumentRecord, ControlError> {
        let CreateDocumentRequest {
            title,
            description,
            template_id,
            content,
            owner,
            metadata,
            tracking_enabled,
        } = request;
        let title = validate_title(&title)?;
        validate_metadata(metadata.as_ref())?;
        let owner = non_blank(owner);

        let (action, bytes, doc) = match (template_id, content) {
            (Some(_), Some(_)) => {
                return Err(ControlError::invalid(
                    "template_id and content cannot both be provided",
                ));
            }
            (None, Some(bytes)) => {
                self.check_size(bytes.len())?;
                let doc = DocxParser::parse_async(bytes.clone()).await?;
                (AuditAction::Import, bytes, doc)
            }
            (Some(template_id), None) => {
                let template = self.require_template(&template_id).await?;
                let bytes = self.blobs.get(&template.file_name).await?;
                let doc = DocxParser::parse_async(bytes.clone()).await?;
                (AuditAction::Create, bytes, doc)
            }
            (None, None) => {
                let mut doc = WordDocument::new();
                let now = timestamp();
                doc.core.title = Some(title.clone());
                doc.core.author.clone_from(&owner);
                doc.core.created = Some(now.clone());
                doc.core.modified = Some(now);
                let bytes = render::docx::write(&doc)?;
                (AuditAction::Create, bytes, doc)
            }
        };

        let document_id = new_id();
        let now = timestamp();
        let mut record = DocumentRecord {
            id: None,
            document_id: document_id.clone(),
            title,
            description: non_blank(description),
            status: DocumentStatus::Draft,
            file_name: schema::document_blob_name(&document_id),
            file_size: bytes.len() as u64,
            mime_type: schema::DOCX_MIME_TYPE.to_string(),
            version: 0,
            tracking_enabled,
            owner: owner.clone(),
            metadata,
            search_text: search_text(&doc),
            created_at: now.clone(),
            updated_at: now,
        };
        self.blobs.put(&record.file_name, &bytes).await?;
        self.snapshot_version(&mut record, Some("Initial version".to_string()), owner)
            .await?;
        let record = self.store.create_document(record).await?;

        info!(document_id = %record.document_id, title = %record.title, "document created");
        self.audit(
            action,
            RESOURCE_DOCUMENT,
            &record.document_id,
            Some(json!({ "title": record.title, "file_size": record.file_size })),
        )
        .await;
        Ok(record)
    }

    /// # Errors
    /// Returns `ControlError::NotFound` when the document does not exist.
    pub async fn get_document(&self, document_id: &str) -> Result<DocumentRecord, ControlError> {
        self.require_document(document_id).await
    }

    pub(crate) async fn require_document(&self, document_id: &str) -> Result<DocumentRecord, ControlError> {
        self.store
            .get_document(document_id)
            .await?
            .ok_or_else(|| ControlError::not_found("Document", document_id))
    }

    /// Lists documents, most recently updated first, with the total match
    /// count for paging.
    ///
    /// # Errors
    /// Returns `ControlError` if the store query fails.
    pub async fn list_documents(
        &self,
        filter: DocumentQuery,
        skip: usize,
        limit: Option<usize>,
    ) -> Result<DocumentPage, ControlError> {
        let limit = schema::clamp_page_size(limit);
        let items = self.store.list_documents(&filter, skip, limit).await?;
        let total = self.store.count_documents(&filter).await?;
        Ok(DocumentPage {
            items,
            total,
            skip,
            limit,
        })
    }

    /// Finds documents whose title or text contains `query`.
    ///
    /// # Errors
    /// Returns `ControlError::InvalidInput` for an empty query.
    pub async fn search_documents(
        &self,
        query: &str,
        limit: Option<usize>,
    ) -> Result<Vec<DocumentRecord>, ControlError> {
        if query.trim().is_empty() {
            return Err(ControlError::invalid("query is required"));
        }
        let filter = DocumentQuery {
            search: Some(query.to_string()),
            ..DocumentQuery::default()
        };
        Ok(self
            .store
            .list_documents(&filter, 0, schema::clamp_page_size(limit))
            .await?)
    }

    /// Updates title, description, status or metadata.
    ///
    /// # Errors
    /// Returns `ControlError::NotFound` for an unknown document and
    /// `ControlError::InvalidInput` for invalid fields.
    pub async fn update_document(
        &self,
        document_id: &str,
        update: DocumentUpdate,
    ) -> Result<DocumentRecord, ControlError> {
        validate_metadata(update.metadata.as_ref())?;
        let mut record = self.require_document(document_id).await?;
        let mut changed = Vec::new();
        if let Some(title) = update.title {
            record.title = validate_title(&title)?;
            changed.push("title");
        }
        if let Some(description) = update.description {
            record.description = non_blank(Some(description));
            changed.push("description");
        }
        if let Some(status) = update.status {
            record.status = status;
            changed.push("status");
        }
        if let Some(metadata) = update.metadata {
            record.metadata = merge_metadata(record.metadata.take(), metadata);
            changed.push("metadata");
        }
        record.updated_at = timestamp();
        let record = self.store.update_document(record).await?;
        self.audit(
            AuditAction::Update,
            RESOURCE_DOCUMENT,
            document_id,
            Some(json!({ "fields": changed })),
        )
        .await;
        Ok(record)
    }

    /// Deletes a document with its versions, comments, revisions, export
    /// jobs and blobs.
    ///
    /// # Errors
    /// Returns `ControlError::NotFound` when the document does not exist.
    pub async fn delete_document(&self, document_id: &str) -> Result<(), ControlError> {
        let record = self.require_document(document_id).await?;
        let _open = match self.cache.get(document_id).await {
            Some(shared) => Some(shared.lock_owned().await),
            None => None,
        };

        let versions = self.store.list_versions(document_id).await?;
        let jobs = self.store.list_export_jobs(document_id).await?;
        self.store.delete_versions(document_id).await?;
        self.store.delete_comments(document_id).await?;
        self.store.delete_revisions(document_id).await?;
        self.store.delete_export_jobs(document_id).await?;
        self.store.delete_document(document_id).await?;
        self.cache.remove(document_id).await;

        let blob_names = std::iter::once(record.file_name.clone())
            .chain(versions.into_iter().map(|version| version.file_name))
            .chain(jobs.into_iter().filter_map(|job| job.file_name));
        for name in blob_names {
            self.blobs.delete(&name).await?;
        }

        info!(document_id, "document deleted");
        self.audit(
            AuditAction::Delete,
            RESOURCE_DOCUMENT,
            document_id,
            Some(json!({ "title": record.title })),
        )
        .await;
        Ok(())
    }

    /// Current `.docx` bytes of a document.
    ///
    /// # Errors
    /// Returns `ControlError::NotFound` when the document does not exist.
    pub async fn document_content(&self, document_id: &str) -> Result<Vec<u8>, ControlError> {
        let record = self.require_document(document_id).await?;
        Ok(self.blobs.get(&record.file_name).await?)
    }

    /// Replaces the content with an uploaded package and snapshots it as a
    /// new version.
    ///
    /// # Errors
    /// Returns `ControlError::Parse` for an invalid package and
    /// `ControlError::InvalidInput` when it is too large.
    pub async fn replace_content(
        &self,
        document_id: &str,
        bytes: Vec<u8>,
        author: Option<String>,
        summary: Option<String>,
    ) -> Result<DocumentRecord, ControlError> {
        self.check_size(bytes.len())?;
        let doc = DocxParser::parse_async(bytes.clone()).await?;
        let mut open = self.lock_document(document_id).await?;
        let mut record = self.require_document(document_id).await?;
        self.blobs.put(&record.file_name, &bytes).await?;
        refresh_content(&mut record, bytes.len(), &doc);
        let summary = non_blank(summary).unwrap_or_else(|| "Content replaced".to_string());
        let version = self
            .snapshot_version(&mut record, Some(summary), non_blank(author))
            .await?;
        let record = self.store.update_document(record).await?;
        *open = doc;
        self.audit(
            AuditAction::Import,
            RESOURCE_DOCUMENT,
            document_id,
            Some(json!({ "version": version.version_number, "file_size": record.file_size })),
        )
        .await;
        Ok(record)
    }

    /// Drops the parsed document from the cache. A document in use stays
    /// open. Returns whether it was dropped.
    pub async fn close_document(&self, document_id: &str) -> bool {
        self.cache.evict(document_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metadata_merges_and_removes_nulls() {
        let merged = merge_metadata(
            Some(json!({ "a": 1, "b": 2 })),
            json!({ "b": null, "c": 3 }),
        );
        assert_eq!(merged, Some(json!({ "a": 1, "c": 3 })));
        assert_eq!(merge_metadata(None, json!({ "x": null })), Some(json!({})));
    }

    #[test]
    fn titles_are_trimmed_and_bounded() {
        assert_eq!(validate_title("  Plan ").unwrap(), "Plan");
        assert!(validate_title("   ").is_err());
        assert!(validate_title(&"x".repeat(256)).is_err());
    }
}
