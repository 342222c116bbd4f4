use docx_store::models::{AuditAction, CommentRecord, CommentStatus};
use docx_store::schema::RESOURCE_COMMENT;
use serde::{Deserialize, Serialize};
use serde_json::json;
use surrealdb::Connection;

use crate::editor::DocumentError;

use super::{ControlError, DocxControlPlane, new_id, timestamp};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AddCommentRequest {
    pub paragraph_index: usize,
    pub author: String,
    pub content: String,
    #[serde(default)]
    pub initials: Option<String>,
    #[serde(default)]
    pub start_offset: Option<usize>,
    #[serde(default)]
    pub end_offset: Option<usize>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct CommentFilter {
    #[serde(default)]
    pub status: Option<CommentStatus>,
    #[serde(default)]
    pub paragraph_index: Option<usize>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CommentUpdate {
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub status: Option<CommentStatus>,
}

/// Treats a comment that is already gone from the package as removed.
fn ignore_missing(result: Result<(), ControlError>) -> Result<(), ControlError> {
    match result {
        Err(ControlError::Document(DocumentError::NotFound(_))) => Ok(()),
        other => other,
    }
}

fn set_status(comment: &mut CommentRecord, status: CommentStatus, now: &str) {
    comment.status = status;
    comment.resolved_at = match status {
        CommentStatus::Resolved => Some(now.to_string()),
        CommentStatus::Open => None,
    };
}

impl<C: Connection> DocxControlPlane<C> {
    /// Adds a comment to the package and records it.
    ///
    /// # Errors
    /// Returns `ControlError::InvalidInput` for missing fields or inverted
    /// offsets and `ControlError::Document` for an unknown paragraph.
    pub async fn add_comment(
        &self,
        document_id: &str,
        request: AddCommentRequest,
    ) -> Result<CommentRecord, ControlError> {
        self.create_comment(document_id, request, None).await
    }

    async fn create_comment(
        &self,
        document_id: &str,
        request: AddCommentRequest,
        parent_id: Option<String>,
    ) -> Result<CommentRecord, ControlError> {
        let AddCommentRequest {
            paragraph_index,
            author,
            content,
            initials,
            start_offset,
            end_offset,
        } = request;
        let author = author.trim().to_string();
        if author.is_empty() {
            return Err(ControlError::invalid("author is required"));
        }
        if content.trim().is_empty() {
            return Err(ControlError::invalid("content is required"));
        }
        if let (Some(start), Some(end)) = (start_offset, end_offset)
            && start > end
        {
            return Err(ControlError::invalid(
                "start_offset must not be greater than end_offset",
            ));
        }

        let docx_comment_id = self
            .edit(document_id, |doc| {
                doc.add_comment(paragraph_index, &author, &content, initials.as_deref())
            })
            .await?;
        let now = timestamp();
        let comment = self
            .store
            .create_comment(CommentRecord {
                id: None,
                comment_id: new_id(),
                document_id: document_id.to_string(),
                docx_comment_id,
                author,
                content,
                status: CommentStatus::Open,
                paragraph_index,
                start_offset,
                end_offset,
                parent_id,
                created_at: now.clone(),
                updated_at: now,
                resolved_at: None,
            })
            .await?;
        self.audit(
            AuditAction::Create,
            RESOURCE_COMMENT,
            &comment.comment_id,
            Some(json!({ "document_id": document_id, "parent_id": comment.parent_id })),
        )
        .await;
        Ok(comment)
    }

    /// # Errors
    /// Returns `ControlError::NotFound` for an unknown document.
    pub async fn list_comments(
        &self,
        document_id: &str,
        filter: CommentFilter,
    ) -> Result<Vec<CommentRecord>, ControlError> {
        self.require_document(document_id).await?;
        Ok(self
            .store
            .list_comments(document_id, filter.status, filter.paragraph_index)
            .await?)
    }

    /// # Errors
    /// Returns `ControlError::NotFound` unless the comment belongs to the document.
    pub async fn get_comment(
        &self,
        document_id: &str,
        comment_id: &str,
    ) -> Result<CommentRecord, ControlError> {
        self.store
            .get_comment(comment_id)
            .await?
            .filter(|comment| comment.document_id == document_id)
            .ok_or_else(|| ControlError::not_found("Comment", comment_id))
    }

    /// Changes the text or status of a comment.
    ///
    /// # Errors
    /// Returns `ControlError::NotFound` for an unknown comment and
    /// `ControlError::InvalidInput` for empty text.
    pub async fn update_comment(
        &self,
        document_id: &str,
        comment_id: &str,
        update: CommentUpdate,
    ) -> Result<CommentRecord, ControlError> {
        let mut comment = self.get_comment(document_id, comment_id).await?;
        let now = timestamp();
        if let Some(content) = update.content {
            if content.trim().is_empty() {
                return Err(ControlError::invalid("content is required"));
            }
            let docx_id = comment.docx_comment_id;
            ignore_missing(
                self.edit(document_id, |doc| doc.update_comment_text(docx_id, &content))
                    .await,
            )?;
            comment.content = content;
        }
        if let Some(status) = update.status {
            set_status(&mut comment, status, &now);
        }
        comment.updated_at = now;
        let comment = self.store.update_comment(comment).await?;
        self.audit(AuditAction::Update, RESOURCE_COMMENT, comment_id, None)
            .await;
        Ok(comment)
    }

    /// Replies to a comment. The reply anchors to the parent's paragraph.
    ///
    /// # Errors
    /// Returns `ControlError::NotFound` when the parent does not exist.
    pub async fn reply_to_comment(
        &self,
        document_id: &str,
        parent_id: &str,
        author: String,
        content: String,
    ) -> Result<CommentRecord, ControlError> {
        let parent = self.get_comment(document_id, parent_id).await?;
        let request = AddCommentRequest {
            paragraph_index: parent.paragraph_index,
            author,
            content,
            ..AddCommentRequest::default()
        };
        self.create_comment(document_id, request, Some(parent.comment_id))
            .await
    }

    /// # Errors
    /// Returns `ControlError::NotFound` for an unknown comment.
    pub async fn resolve_comment(
        &self,
        document_id: &str,
        comment_id: &str,
    ) -> Result<CommentRecord, ControlError> {
        let update = CommentUpdate {
            status: Some(CommentStatus::Resolved),
            ..CommentUpdate::default()
        };
        self.update_comment(document_id, comment_id, update).await
    }

    /// # Errors
    /// Returns `ControlError::NotFound` for an unknown comment.
    pub async fn reopen_comment(
        &self,
        document_id: &str,
        comment_id: &str,
    ) -> Result<CommentRecord, ControlError> {
        let update = CommentUpdate {
            status: Some(CommentStatus::Open),
            ..CommentUpdate::default()
        };
        self.update_comment(document_id, comment_id, update).await
    }

    /// Deletes a comment and every reply beneath it. Returns the number of
    /// comments removed.
    ///
    /// # Errors
    /// Returns `ControlError::NotFound` for an unknown comment.
    pub async fn delete_comment(&self, document_id: &str, comment_id: &str) -> Result<usize, ControlError> {
        let root = self.get_comment(document_id, comment_id).await?;
        let all = self.store.list_comments(document_id, None, None).await?;

        let mut doomed = vec![root];
        let mut cursor = 0;
        while let Some(current) = doomed.get(cursor) {
            let parent = current.comment_id.clone();
            doomed.extend(
                all.iter()
                    .filter(|comment| comment.parent_id.as_deref() == Some(parent.as_str()))
                    .cloned(),
            );
            cursor += 1;
        }

        let docx_ids: Vec<u32> = doomed.iter().map(|comment| comment.docx_comment_id).collect();
        ignore_missing(
            self.edit(document_id, |doc| {
                for id in &docx_ids {
                    match doc.remove_comment(*id) {
                        Ok(()) | Err(DocumentError::NotFound(_)) => {}
                        Err(err) => return Err(err),
                    }
                }
                Ok(())
            })
            .await,
        )?;
        for comment in &doomed {
            self.store.delete_comment(&comment.comment_id).await?;
        }
        self.audit(
            AuditAction::Delete,
            RESOURCE_COMMENT,
            comment_id,
            Some(json!({ "document_id": document_id, "removed": doomed.len() })),
        )
        .await;
        Ok(doomed.len())
    }
}
