use docx_core::control::ProposeRevisionRequest;
use docx_store::models::RevisionAction;
use rmcp::{
    ErrorData,
    handler::server::wrapper::Parameters,
    model::CallToolResult,
    schemars,
    tool,
    tool_router,
};
use serde::{Deserialize, Serialize};
use surrealdb::Connection;

use crate::{DocxMcp, helpers};

/// Parameters for turning revision tracking on or off.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct SetTrackingParams {
    pub document_id: String,
    pub enabled: bool,
}

/// Parameters for proposing a tracked change.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct ProposeRevisionParams {
    pub document_id: String,
    /// insert, delete, replace or format.
    pub action: String,
    pub paragraph_index: usize,
    /// New text; required for insert and replace.
    pub content: Option<String>,
    pub author: String,
}

/// Parameters for listing revisions.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct ListRevisionsParams {
    pub document_id: String,
    #[serde(default)]
    pub pending_only: bool,
}

/// Parameters for addressing one revision.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct RevisionIdParams {
    pub document_id: String,
    pub revision_id: String,
}

/// Parameters for accepting or rejecting a revision.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct DecideRevisionParams {
    pub document_id: String,
    pub revision_id: String,
    pub decided_by: Option<String>,
}

/// Parameters for accepting or rejecting every pending revision.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct DecideAllParams {
    pub document_id: String,
    pub decided_by: Option<String>,
}

#[tool_router(router = tool_router_revisions, vis = "pub")]
impl<C: Connection> DocxMcp<C> {
    #[tool(description = "Turn change tracking on or off. Revisions can only be proposed while it is on.")]
    async fn set_tracking(
        &self,
        Parameters(params): Parameters<SetTrackingParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let record = self
            .control
            .set_tracking(&params.document_id, params.enabled)
            .await
            .map_err(helpers::map_err)?;
        helpers::json_result(record)
    }

    #[tool(description = "Propose a change to a paragraph without applying it.")]
    async fn propose_revision(
        &self,
        Parameters(params): Parameters<ProposeRevisionParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let request = ProposeRevisionRequest {
            action: helpers::parse::<RevisionAction>(&params.action)?,
            paragraph_index: params.paragraph_index,
            content: params.content,
            author: params.author,
        };
        let revision = self
            .control
            .propose_revision(&params.document_id, request)
            .await
            .map_err(helpers::map_err)?;
        helpers::json_result(revision)
    }

    #[tool(description = "List revisions, oldest first, optionally only pending ones.")]
    async fn list_revisions(
        &self,
        Parameters(params): Parameters<ListRevisionsParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let revisions = self
            .control
            .list_revisions(&params.document_id, params.pending_only)
            .await
            .map_err(helpers::map_err)?;
        helpers::json_result(revisions)
    }

    #[tool(description = "Fetch one revision.")]
    async fn get_revision(
        &self,
        Parameters(params): Parameters<RevisionIdParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let revision = self
            .control
            .get_revision(&params.document_id, &params.revision_id)
            .await
            .map_err(helpers::map_err)?;
        helpers::json_result(revision)
    }

    #[tool(description = "Accept a pending revision and apply it to the document.")]
    async fn accept_revision(
        &self,
        Parameters(params): Parameters<DecideRevisionParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let revision = self
            .control
            .accept_revision(&params.document_id, &params.revision_id, params.decided_by)
            .await
            .map_err(helpers::map_err)?;
        helpers::json_result(revision)
    }

    #[tool(description = "Reject a pending revision. The document is unchanged.")]
    async fn reject_revision(
        &self,
        Parameters(params): Parameters<DecideRevisionParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let revision = self
            .control
            .reject_revision(&params.document_id, &params.revision_id, params.decided_by)
            .await
            .map_err(helpers::map_err)?;
        helpers::json_result(revision)
    }

    #[tool(description = "Accept every pending revision, oldest first. Reports processed and failed ids.")]
    async fn accept_all_revisions(
        &self,
        Parameters(params): Parameters<DecideAllParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let batch = self
            .control
            .accept_all_revisions(&params.document_id, params.decided_by)
            .await
            .map_err(helpers::map_err)?;
        helpers::json_result(batch)
    }

    #[tool(description = "Reject every pending revision.")]
    async fn reject_all_revisions(
        &self,
        Parameters(params): Parameters<DecideAllParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let batch = self
            .control
            .reject_all_revisions(&params.document_id, params.decided_by)
            .await
            .map_err(helpers::map_err)?;
        helpers::json_result(batch)
    }
}
