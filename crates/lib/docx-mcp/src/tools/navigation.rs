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

/// Parameters for inserting a table of contents.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct TableOfContentsParams {
    pub document_id: String,
    pub title: Option<String>,
    /// Deepest heading level listed, 1 to 9. Defaults to 3.
    pub max_level: Option<u8>,
}

/// Parameters for adding a bookmark.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct AddBookmarkParams {
    pub document_id: String,
    pub paragraph_index: usize,
    /// Starts with a letter; letters, digits and underscores; at most 40 characters.
    pub name: String,
}

/// Parameters for addressing a bookmark by name.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct BookmarkNameParams {
    pub document_id: String,
    pub name: String,
}

/// Parameters for a link to a URL or to a bookmark in the document.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct AddHyperlinkParams {
    pub document_id: String,
    pub paragraph_index: usize,
    pub text: String,
    pub url: Option<String>,
    pub bookmark: Option<String>,
}

#[tool_router(router = tool_router_navigation, vis = "pub")]
impl<C: Connection> DocxMcp<C> {
    #[tool(description = "List headings with level and paragraph index.")]
    async fn get_outline(
        &self,
        Parameters(params): Parameters<DocumentIdParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let headings = self.read(&params.document_id, |doc| Ok(doc.headings())).await?;
        helpers::json_result(headings)
    }

    #[tool(description = "Insert a table-of-contents field at the start of the document. Word fills it on open.")]
    async fn add_table_of_contents(
        &self,
        Parameters(params): Parameters<TableOfContentsParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let title = helpers::non_blank(params.title);
        let max_level = params.max_level.unwrap_or(3);
        let index = self
            .edit(&params.document_id, |doc| {
                doc.add_table_of_contents(title.as_deref(), max_level)
            })
            .await?;
        helpers::json_result(json!({ "paragraph_index": index }))
    }

    #[tool(description = "Add a named bookmark around a paragraph.")]
    async fn add_bookmark(
        &self,
        Parameters(params): Parameters<AddBookmarkParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let id = self
            .edit(&params.document_id, |doc| {
                doc.add_bookmark(params.paragraph_index, &params.name)
            })
            .await?;
        helpers::json_result(json!({ "id": id, "name": params.name }))
    }

    #[tool(description = "List bookmarks.")]
    async fn list_bookmarks(
        &self,
        Parameters(params): Parameters<DocumentIdParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let bookmarks = self.read(&params.document_id, |doc| Ok(doc.bookmarks())).await?;
        helpers::json_result(bookmarks)
    }

    #[tool(description = "Delete a bookmark by name.")]
    async fn delete_bookmark(
        &self,
        Parameters(params): Parameters<BookmarkNameParams>,
    ) -> Result<CallToolResult, ErrorData> {
        self.edit(&params.document_id, |doc| doc.delete_bookmark(&params.name))
            .await?;
        helpers::json_result(json!({ "deleted": params.name }))
    }

    #[tool(description = "Append a hyperlink to a paragraph. Give url for an external link or bookmark for an internal one.")]
    async fn add_hyperlink(
        &self,
        Parameters(params): Parameters<AddHyperlinkParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let url = helpers::non_blank(params.url);
        let bookmark = helpers::non_blank(params.bookmark);
        let index = params.paragraph_index;
        match (url, bookmark) {
            (Some(url), None) => {
                self.edit(&params.document_id, |doc| doc.add_hyperlink(index, &params.text, &url))
                    .await?;
            }
            (None, Some(bookmark)) => {
                self.edit(&params.document_id, |doc| {
                    doc.add_internal_link(index, &params.text, &bookmark)
                })
                .await?;
            }
            _ => {
                return Err(helpers::invalid_params(
                    "Provide exactly one of url or bookmark",
                ));
            }
        }
        helpers::json_result(json!({ "paragraph_index": index, "text": params.text }))
    }

    #[tool(description = "List hyperlinks with their targets.")]
    async fn list_hyperlinks(
        &self,
        Parameters(params): Parameters<DocumentIdParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let links = self.read(&params.document_id, |doc| Ok(doc.hyperlinks())).await?;
        helpers::json_result(links)
    }
}
