//! MCP server implementation for docx-mcp.
//!
//! This crate wires the document control plane into rmcp tool handlers. Tools
//! are grouped by area; every document tool takes a `document_id` and binary
//! payloads travel as base64.

mod helpers;
mod resources;
mod tools;
pub mod server;

use docx_core::control::DocxControlPlane;
use docx_core::document::WordDocument;
use docx_core::editor::DocumentResult;
use rmcp::{
    ErrorData,
    RoleServer,
    ServerHandler,
    handler::server::tool::ToolRouter,
    service::RequestContext,
    tool,
    tool_handler,
    tool_router,
};
use rmcp::model::{
    CallToolResult,
    Content,
    ListResourceTemplatesResult,
    ListResourcesResult,
    PaginatedRequestParams,
    ReadResourceRequestParams,
    ReadResourceResult,
    ServerCapabilities,
    ServerInfo,
};
use surrealdb::Connection;

const SERVER_INSTRUCTIONS: &str = r"docx-mcp creates, edits and manages Word (.docx) documents.

Workflow:
1. Create a document with `create_document` (blank, from a `template_id`, or from base64 `content`),
   or find one with `list_documents` / `search_documents`. Every other tool takes its `document_id`.
2. Inspect it with `get_document_info`, `get_paragraphs`, `get_outline`, `list_tables`, `list_styles`.
3. Edit it with the text, table, list, style, media, layout and navigation tools. Indexes are zero-based
   and count top-level paragraphs (or tables, sections, images). Every edit is saved immediately.
4. Review with comments (`add_comment`, `reply_to_comment`, `resolve_comment`) and tracked revisions
   (`set_tracking`, `propose_revision`, `accept_revision`, `reject_revision`).
5. Snapshot with `create_version`; `restore_version` and `compare_versions` work on snapshots.
6. Export with `export_document` (html, markdown, text, docx) or queue `start_export` and poll `get_export_job`.
7. Group several edits into one save with `execute_batch`; `validate_batch` dry-runs the same list.

Notes:
- Binary inputs and outputs (documents, images, docx exports) are base64 encoded.
- Read-only views of each document are resources at `docx://documents/{document_id}/{view}`
  (content, structure, metadata, paragraphs, tables, styles, headings, comments, bookmarks).
- Use `help` and `editing_help` for details. `health` returns `ok`.";

/// MCP server wrapper around the document control plane and tool routers.
#[derive(Clone)]
pub struct DocxMcp<C: Connection> {
    tool_router: ToolRouter<Self>,
    control: DocxControlPlane<C>,
}

impl<C: Connection> DocxMcp<C> {
    #[must_use]
    pub fn new(control: DocxControlPlane<C>) -> Self {
        let tool_router = Self::tool_router_core()
            + Self::tool_router_documents()
            + Self::tool_router_text()
            + Self::tool_router_tables()
            + Self::tool_router_lists()
            + Self::tool_router_styles()
            + Self::tool_router_media()
            + Self::tool_router_layout()
            + Self::tool_router_navigation()
            + Self::tool_router_comments()
            + Self::tool_router_versions()
            + Self::tool_router_revisions()
            + Self::tool_router_export()
            + Self::tool_router_batch()
            + Self::tool_router_context();
        Self {
            tool_router,
            control,
        }
    }

    #[must_use]
    pub const fn control(&self) -> &DocxControlPlane<C> {
        &self.control
    }

    pub(crate) async fn read<T, F>(&self, document_id: &str, operation: F) -> Result<T, ErrorData>
    where
        F: FnOnce(&WordDocument) -> DocumentResult<T>,
    {
        self.control
            .read(document_id, operation)
            .await
            .map_err(helpers::map_err)
    }

    pub(crate) async fn edit<T, F>(&self, document_id: &str, operation: F) -> Result<T, ErrorData>
    where
        F: FnOnce(&mut WordDocument) -> DocumentResult<T>,
    {
        self.control
            .edit(document_id, operation)
            .await
            .map_err(helpers::map_err)
    }
}

#[tool_router(router = tool_router_core, vis = "pub")]
impl<C: Connection> DocxMcp<C> {
    #[tool(description = "Health check. Returns 'ok'.")]
    async fn health(&self) -> Result<CallToolResult, ErrorData> {
        Ok(CallToolResult::success(vec![Content::text("ok")]))
    }
}

#[tool_handler]
impl<C: Connection> ServerHandler for DocxMcp<C> {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(SERVER_INSTRUCTIONS.to_string()),
            capabilities: ServerCapabilities::builder()
                .enable_resources()
                .enable_tools()
                .build(),
            ..Default::default()
        }
    }

    async fn list_resources(
        &self,
        request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListResourcesResult, ErrorData> {
        let cursor = request.and_then(|params| params.cursor);
        self.list_document_resources(cursor.as_deref()).await
    }

    async fn list_resource_templates(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListResourceTemplatesResult, ErrorData> {
        Ok(Self::resource_templates())
    }

    async fn read_resource(
        &self,
        request: ReadResourceRequestParams,
        _context: RequestContext<RoleServer>,
    ) -> Result<ReadResourceResult, ErrorData> {
        self.read_document_resource(&request.uri).await
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use docx_core::control::DocxControlPlane;
    use docx_core::store::{BlobStore, SurrealDocStore};
    use rmcp::model::CallToolResult;
    use serde_json::Value;
    use surrealdb::Surreal;
    use surrealdb::engine::local::{Db, Mem};
    use tempfile::TempDir;

    use crate::DocxMcp;

    pub async fn build_server(db_name: &str) -> (DocxMcp<Db>, TempDir) {
        let db = Surreal::new::<Mem>(())
            .await
            .expect("failed to create in-memory surrealdb instance");
        db.use_ns("docx")
            .use_db(db_name)
            .await
            .expect("failed to select surrealdb namespace/db");
        let dir = tempfile::tempdir().expect("failed to create blob directory");
        let blobs = BlobStore::open(dir.path())
            .await
            .expect("failed to open blob store");
        let control = DocxControlPlane::new(SurrealDocStore::new(db), blobs);
        (DocxMcp::new(control), dir)
    }

    pub fn json_of(result: &CallToolResult) -> Value {
        let text = result
            .content
            .first()
            .and_then(|content| content.as_text())
            .expect("tool result should carry text content");
        serde_json::from_str(&text.text).expect("tool result should be JSON")
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use rmcp::model::ErrorCode;

    use super::*;

    #[tokio::test]
    async fn every_tool_group_is_routed_once() {
        let (server, _dir) = test_support::build_server("routes").await;
        let names: Vec<String> = server
            .tool_router
            .list_all()
            .into_iter()
            .map(|tool| tool.name.to_string())
            .collect();
        let unique: HashSet<&String> = names.iter().collect();
        assert_eq!(unique.len(), names.len());
        for name in [
            "health",
            "create_document",
            "add_paragraph",
            "merge_cells",
            "create_list",
            "apply_style",
            "insert_image",
            "set_margins",
            "add_bookmark",
            "reply_to_comment",
            "restore_version",
            "accept_all_revisions",
            "start_export",
            "editing_help",
            "regex_replace",
            "execute_batch",
            "validate_batch",
        ] {
            assert!(unique.contains(&name.to_string()), "missing tool {name}");
        }
    }

    #[tokio::test]
    async fn tool_parameters_carry_a_description() {
        let (server, _dir) = test_support::build_server("schemas").await;
        for tool in server.tool_router.list_all() {
            if !tool.input_schema.contains_key("properties") {
                continue;
            }
            let description = tool
                .input_schema
                .get("description")
                .and_then(|value| value.as_str())
                .unwrap_or_default();
            assert!(
                description.starts_with("Parameters for"),
                "{} parameters lack a description",
                tool.name
            );
        }
    }

    #[tokio::test]
    async fn unknown_documents_map_to_resource_not_found() {
        let (server, _dir) = test_support::build_server("missing").await;
        let err = server
            .edit("no-such-document", |doc| doc.add_paragraph("x", None, None))
            .await
            .expect_err("editing a missing document should fail");
        assert_eq!(err.code, ErrorCode::RESOURCE_NOT_FOUND);
    }
}
