use docx_core::control::{AddCommentRequest, CommentFilter, CommentUpdate};
use docx_store::models::CommentStatus;
use rmcp::{
    ErrorData,
    handler::server::wrapper::Parameters,
    model::CallToolResult,
    schemars,
    tool,
    tool_router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use surrealdb::Connection;

use super::documents::DocumentIdParams;
use crate::{DocxMcp, helpers};

/// Parameters for adding a review comment to a paragraph.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct AddCommentParams {
    pub document_id: String,
    pub paragraph_index: usize,
    pub author: String,
    pub content: String,
    pub initials: Option<String>,
    /// Character offsets of the commented text, recorded with the comment.
    pub start_offset: Option<usize>,
    pub end_offset: Option<usize>,
}

/// Parameters for listing comments on a document.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct ListCommentsParams {
    pub document_id: String,
    /// open or resolved.
    pub status: Option<String>,
    pub paragraph_index: Option<usize>,
}

/// Parameters for addressing one comment.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct CommentIdParams {
    pub document_id: String,
    pub comment_id: String,
}

/// Parameters for editing a comment.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct UpdateCommentParams {
    pub document_id: String,
    pub comment_id: String,
    pub content: Option<String>,
    pub status: Option<String>,
}

/// Parameters for replying to a comment.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct ReplyCommentParams {
    pub document_id: String,
    pub comment_id: String,
    pub author: String,
    pub content: String,
}

#[tool_router(router = tool_router_comments, vis = "pub")]
impl<C: Connection> DocxMcp<C> {
    #[tool(description = "Add a review comment anchored to a paragraph.")]
    async fn add_comment(
        &self,
        Parameters(params): Parameters<AddCommentParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let request = AddCommentRequest {
            paragraph_index: params.paragraph_index,
            author: params.author,
            content: params.content,
            initials: helpers::non_blank(params.initials),
            start_offset: params.start_offset,
            end_offset: params.end_offset,
        };
        let comment = self
            .control
            .add_comment(&params.document_id, request)
            .await
            .map_err(helpers::map_err)?;
        helpers::json_result(comment)
    }

    #[tool(description = "List review comments, oldest first, optionally by status or paragraph.")]
    async fn list_comments(
        &self,
        Parameters(params): Parameters<ListCommentsParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let filter = CommentFilter {
            status: helpers::parse_opt::<CommentStatus>(params.status.as_deref())?,
            paragraph_index: params.paragraph_index,
        };
        let comments = self
            .control
            .list_comments(&params.document_id, filter)
            .await
            .map_err(helpers::map_err)?;
        helpers::json_result(comments)
    }

    #[tool(description = "List the comments stored inside the .docx package, including ones from imported files.")]
    async fn get_document_comments(
        &self,
        Parameters(params): Parameters<DocumentIdParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let comments = self
            .read(&params.document_id, |doc| Ok(doc.comments_list()))
            .await?;
        helpers::json_result(comments)
    }

    #[tool(description = "Fetch one review comment.")]
    async fn get_comment(
        &self,
        Parameters(params): Parameters<CommentIdParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let comment = self
            .control
            .get_comment(&params.document_id, &params.comment_id)
            .await
            .map_err(helpers::map_err)?;
        helpers::json_result(comment)
    }

    #[tool(description = "Change a comment's text or status (open, resolved).")]
    async fn update_comment(
        &self,
        Parameters(params): Parameters<UpdateCommentParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let update = CommentUpdate {
            content: params.content,
            status: helpers::parse_opt::<CommentStatus>(params.status.as_deref())?,
        };
        let comment = self
            .control
            .update_comment(&params.document_id, &params.comment_id, update)
            .await
            .map_err(helpers::map_err)?;
        helpers::json_result(comment)
    }

    #[tool(description = "Reply to a comment. The reply anchors to the same paragraph.")]
    async fn reply_to_comment(
        &self,
        Parameters(params): Parameters<ReplyCommentParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let reply = self
            .control
            .reply_to_comment(&params.document_id, &params.comment_id, params.author, params.content)
            .await
            .map_err(helpers::map_err)?;
        helpers::json_result(reply)
    }

    #[tool(description = "Mark a comment as resolved.")]
    async fn resolve_comment(
        &self,
        Parameters(params): Parameters<CommentIdParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let comment = self
            .control
            .resolve_comment(&params.document_id, &params.comment_id)
            .await
            .map_err(helpers::map_err)?;
        helpers::json_result(comment)
    }

    #[tool(description = "Reopen a resolved comment.")]
    async fn reopen_comment(
        &self,
        Parameters(params): Parameters<CommentIdParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let comment = self
            .control
            .reopen_comment(&params.document_id, &params.comment_id)
            .await
            .map_err(helpers::map_err)?;
        helpers::json_result(comment)
    }

    #[tool(description = "Delete a comment and all replies beneath it. Returns the number removed.")]
    async fn delete_comment(
        &self,
        Parameters(params): Parameters<CommentIdParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let removed = self
            .control
            .delete_comment(&params.document_id, &params.comment_id)
            .await
            .map_err(helpers::map_err)?;
        helpers::json_result(json!({ "removed": removed }))
    }
}
