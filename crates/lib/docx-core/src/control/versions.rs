use docx_store::models::{AuditAction, DocumentRecord, VersionRecord};
use docx_store::schema::{RESOURCE_DOCUMENT, version_blob_name};
use serde::{Deserialize, Serialize};
use serde_json::json;
use surrealdb::Connection;
use tracing::info;

use crate::document::WordDocument;
use crate::parsers::DocxParser;

use super::documents::refresh_content;
use super::{ControlError, DocxControlPlane, non_blank, timestamp};

/// Text-level differences between two versions. Diffs are `b - a`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionComparison {
    pub version_a: u32,
    pub version_b: u32,
    pub are_identical: bool,
    pub text_length_diff: i64,
    pub paragraph_count_diff: i64,
    pub changed_paragraphs: usize,
}

fn signed(value: usize) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

fn compare(version_a: u32, a: &WordDocument, version_b: u32, b: &WordDocument) -> VersionComparison {
    let left: Vec<String> = a.paragraphs().map(|paragraph| paragraph.text()).collect();
    let right: Vec<String> = b.paragraphs().map(|paragraph| paragraph.text()).collect();
    let left_text = left.join("\n");
    let right_text = right.join("\n");
    let changed_paragraphs = (0..left.len().max(right.len()))
        .filter(|index| left.get(*index) != right.get(*index))
        .count();
    VersionComparison {
        version_a,
        version_b,
        are_identical: left_text == right_text,
        text_length_diff: signed(right_text.chars().count()) - signed(left_text.chars().count()),
        paragraph_count_diff: signed(right.len()) - signed(left.len()),
        changed_paragraphs,
    }
}

impl<C: Connection> DocxControlPlane<C> {
    /// Copies the working blob into the next version and records it. Bumps
    /// `record.version` but does not save the record.
    pub(crate) async fn snapshot_version(
        &self,
        record: &mut DocumentRecord,
        change_summary: Option<String>,
        created_by: Option<String>,
    ) -> Result<VersionRecord, ControlError> {
        let number = record.version + 1;
        let file_name = version_blob_name(&record.document_id, number);
        let file_size = self.blobs.copy(&record.file_name, &file_name).await?;
        let version = self
            .store
            .create_version(VersionRecord {
                id: None,
                document_id: record.document_id.clone(),
                version_number: number,
                file_name,
                file_size,
                change_summary,
                created_by,
                created_at: timestamp(),
            })
            .await?;
        record.version = number;
        Ok(version)
    }

    /// # Errors
    /// Returns `ControlError::NotFound` for an unknown document.
    pub async fn list_versions(&self, document_id: &str) -> Result<Vec<VersionRecord>, ControlError> {
        self.require_document(document_id).await?;
        Ok(self.store.list_versions(document_id).await?)
    }

    /// # Errors
    /// Returns `ControlError::NotFound` for an unknown document or version.
    pub async fn get_version(
        &self,
        document_id: &str,
        version_number: u32,
    ) -> Result<VersionRecord, ControlError> {
        self.store
            .get_version(document_id, version_number)
            .await?
            .ok_or_else(|| {
                ControlError::NotFound(format!(
                    "Version {version_number} not found for document {document_id}"
                ))
            })
    }

    /// `.docx` bytes of a stored version.
    ///
    /// # Errors
    /// Returns `ControlError::NotFound` for an unknown document or version.
    pub async fn version_content(
        &self,
        document_id: &str,
        version_number: u32,
    ) -> Result<Vec<u8>, ControlError> {
        let version = self.get_version(document_id, version_number).await?;
        Ok(self.blobs.get(&version.file_name).await?)
    }

    /// Snapshots the working copy as a new version.
    ///
    /// # Errors
    /// Returns `ControlError::NotFound` for an unknown document.
    pub async fn create_version(
        &self,
        document_id: &str,
        change_summary: Option<String>,
        created_by: Option<String>,
    ) -> Result<VersionRecord, ControlError> {
        let _guard = self.lock_document(document_id).await?;
        let mut record = self.require_document(document_id).await?;
        let version = self
            .snapshot_version(&mut record, non_blank(change_summary), non_blank(created_by))
            .await?;
        record.updated_at = timestamp();
        self.store.update_document(record).await?;
        info!(document_id, version = version.version_number, "version created");
        self.audit(
            AuditAction::Create,
            RESOURCE_DOCUMENT,
            document_id,
            Some(json!({ "version": version.version_number })),
        )
        .await;
        Ok(version)
    }

    /// Makes an earlier version current again by copying it into a new
    /// version. History is never rewritten.
    ///
    /// # Errors
    /// Returns `ControlError::NotFound` for an unknown document or version.
    pub async fn restore_version(
        &self,
        document_id: &str,
        version_number: u32,
        created_by: Option<String>,
    ) -> Result<VersionRecord, ControlError> {
        let source = self.get_version(document_id, version_number).await?;
        let bytes = self.blobs.get(&source.file_name).await?;
        let restored = DocxParser::parse_async(bytes.clone()).await?;

        let mut doc = self.lock_document(document_id).await?;
        let mut record = self.require_document(document_id).await?;
        self.blobs.put(&record.file_name, &bytes).await?;
        refresh_content(&mut record, bytes.len(), &restored);
        *doc = restored;
        let version = self
            .snapshot_version(
                &mut record,
                Some(format!("Restored from version {version_number}")),
                non_blank(created_by),
            )
            .await?;
        self.store.update_document(record).await?;
        info!(document_id, from = version_number, version = version.version_number, "version restored");
        self.audit(
            AuditAction::Update,
            RESOURCE_DOCUMENT,
            document_id,
            Some(json!({ "restored_from": version_number, "version": version.version_number })),
        )
        .await;
        Ok(version)
    }

    /// Compares the paragraph text of two versions.
    ///
    /// # Errors
    /// Returns `ControlError::NotFound` when either version is missing.
    pub async fn compare_versions(
        &self,
        document_id: &str,
        version_a: u32,
        version_b: u32,
    ) -> Result<VersionComparison, ControlError> {
        let left = self.version_content(document_id, version_a).await?;
        let right = self.version_content(document_id, version_b).await?;
        let left = DocxParser::parse_async(left).await?;
        let right = DocxParser::parse_async(right).await?;
        Ok(compare(version_a, &left, version_b, &right))
    }

    /// Deletes a non-current version and its snapshot.
    ///
    /// # Errors
    /// Returns `ControlError::Conflict` for the current version and
    /// `ControlError::NotFound` for an unknown one.
    pub async fn delete_version(&self, document_id: &str, version_number: u32) -> Result<(), ControlError> {
        let record = self.require_document(document_id).await?;
        if version_number == record.version {
            return Err(ControlError::Conflict(
                "Cannot delete the current version".to_string(),
            ));
        }
        let version = self.get_version(document_id, version_number).await?;
        self.store.delete_version(document_id, version_number).await?;
        self.blobs.delete(&version.file_name).await?;
        self.audit(
            AuditAction::Delete,
            RESOURCE_DOCUMENT,
            document_id,
            Some(json!({ "version": version_number })),
        )
        .await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::ParagraphUpdate;

    #[test]
    fn comparison_counts_changed_paragraphs() {
        let mut a = WordDocument::new();
        a.add_paragraph("one", None, None).unwrap();
        a.add_paragraph("two", None, None).unwrap();
        let mut b = a.clone();
        b.update_paragraph(
            1,
            &ParagraphUpdate {
                text: Some("two!".to_string()),
                ..ParagraphUpdate::default()
            },
        )
        .unwrap();
        b.add_paragraph("three", None, None).unwrap();

        let result = compare(1, &a, 2, &b);
        assert!(!result.are_identical);
        assert_eq!(result.paragraph_count_diff, 1);
        assert_eq!(result.changed_paragraphs, 2);
        assert_eq!(result.text_length_diff, 7);
        assert!(compare(1, &a, 1, &a).are_identical);
    }
}
