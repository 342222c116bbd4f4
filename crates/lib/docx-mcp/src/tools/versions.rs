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

/// Parameters for addressing one version.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct VersionParams {
    pub document_id: String,
    pub version_number: u32,
}

/// Parameters for creating a version.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct CreateVersionParams {
    pub document_id: String,
    pub change_summary: Option<String>,
    pub created_by: Option<String>,
}

/// Parameters for restoring a version.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct RestoreVersionParams {
    pub document_id: String,
    pub version_number: u32,
    pub created_by: Option<String>,
}

/// Parameters for comparing two versions.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct CompareVersionsParams {
    pub document_id: String,
    pub version_a: u32,
    pub version_b: u32,
}

#[tool_router(router = tool_router_versions, vis = "pub")]
impl<C: Connection> DocxMcp<C> {
    #[tool(description = "List version snapshots, oldest first.")]
    async fn list_versions(
        &self,
        Parameters(params): Parameters<DocumentIdParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let versions = self
            .control
            .list_versions(&params.document_id)
            .await
            .map_err(helpers::map_err)?;
        helpers::json_result(versions)
    }

    #[tool(description = "Fetch one version record.")]
    async fn get_version(
        &self,
        Parameters(params): Parameters<VersionParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let version = self
            .control
            .get_version(&params.document_id, params.version_number)
            .await
            .map_err(helpers::map_err)?;
        helpers::json_result(version)
    }

    #[tool(description = "Snapshot the current content as a new version.")]
    async fn create_version(
        &self,
        Parameters(params): Parameters<CreateVersionParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let version = self
            .control
            .create_version(&params.document_id, params.change_summary, params.created_by)
            .await
            .map_err(helpers::map_err)?;
        helpers::json_result(version)
    }

    #[tool(description = "Make an earlier version current again. The restore is recorded as a new version.")]
    async fn restore_version(
        &self,
        Parameters(params): Parameters<RestoreVersionParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let version = self
            .control
            .restore_version(&params.document_id, params.version_number, params.created_by)
            .await
            .map_err(helpers::map_err)?;
        helpers::json_result(version)
    }

    #[tool(description = "Compare the paragraph text of two versions.")]
    async fn compare_versions(
        &self,
        Parameters(params): Parameters<CompareVersionsParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let comparison = self
            .control
            .compare_versions(&params.document_id, params.version_a, params.version_b)
            .await
            .map_err(helpers::map_err)?;
        helpers::json_result(comparison)
    }

    #[tool(description = "Download a version's .docx package as base64.")]
    async fn get_version_content(
        &self,
        Parameters(params): Parameters<VersionParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let bytes = self
            .control
            .version_content(&params.document_id, params.version_number)
            .await
            .map_err(helpers::map_err)?;
        helpers::json_result(json!({
            "version_number": params.version_number,
            "size": bytes.len(),
            "content_base64": helpers::encode_base64(&bytes),
        }))
    }

    #[tool(description = "Delete a version snapshot. The current version cannot be deleted.")]
    async fn delete_version(
        &self,
        Parameters(params): Parameters<VersionParams>,
    ) -> Result<CallToolResult, ErrorData> {
        self.control
            .delete_version(&params.document_id, params.version_number)
            .await
            .map_err(helpers::map_err)?;
        helpers::json_result(json!({ "deleted_version": params.version_number }))
    }
}
