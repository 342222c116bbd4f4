use docx_core::document::{ListKind, NumberFormat};
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

use super::text::ParagraphIndexParams;
use crate::{DocxMcp, helpers};

/// Parameters for creating a list from items.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct CreateListParams {
    pub document_id: String,
    pub items: Vec<String>,
    /// bullet or numbered.
    pub list_type: String,
    /// decimal, lowerLetter, upperLetter, lowerRoman or upperRoman.
    pub number_format: Option<String>,
}

/// Parameters for adding a list item.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct AddListItemParams {
    pub document_id: String,
    pub text: String,
    pub list_type: String,
    /// Nesting level, 0 to 8.
    #[serde(default)]
    pub level: u8,
}

/// Parameters for changing a list type.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct ListTypeParams {
    pub document_id: String,
    pub paragraph_index: usize,
    pub list_type: String,
}

/// Parameters for setting a list level.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct ListLevelParams {
    pub document_id: String,
    pub paragraph_index: usize,
    pub level: u8,
}

/// Parameters for reading list items.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct ListItemsParams {
    pub document_id: String,
    /// Any item of the list; all list items in the document when absent.
    pub paragraph_index: Option<usize>,
}

#[tool_router(router = tool_router_lists, vis = "pub")]
impl<C: Connection> DocxMcp<C> {
    #[tool(description = "Append a bulleted or numbered list. Returns the new paragraph indexes.")]
    async fn create_list(
        &self,
        Parameters(params): Parameters<CreateListParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let kind = helpers::parse::<ListKind>(&params.list_type)?;
        let format = helpers::parse_opt::<NumberFormat>(params.number_format.as_deref())?;
        let indexes = self
            .edit(&params.document_id, |doc| doc.create_list(&params.items, kind, format))
            .await?;
        helpers::json_result(json!({ "paragraph_indexes": indexes }))
    }

    #[tool(description = "Append one list item, continuing the preceding list of the same type.")]
    async fn add_list_item(
        &self,
        Parameters(params): Parameters<AddListItemParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let kind = helpers::parse::<ListKind>(&params.list_type)?;
        let index = self
            .edit(&params.document_id, |doc| doc.add_list_item(&params.text, kind, params.level))
            .await?;
        helpers::json_result(json!({ "paragraph_index": index }))
    }

    #[tool(description = "Turn a paragraph into a list item.")]
    async fn convert_to_list(
        &self,
        Parameters(params): Parameters<ListTypeParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let kind = helpers::parse::<ListKind>(&params.list_type)?;
        let num_id = self
            .edit(&params.document_id, |doc| doc.convert_to_list(params.paragraph_index, kind))
            .await?;
        helpers::json_result(json!({ "paragraph_index": params.paragraph_index, "num_id": num_id }))
    }

    #[tool(description = "Turn a list item back into a plain paragraph.")]
    async fn remove_list_formatting(
        &self,
        Parameters(params): Parameters<ParagraphIndexParams>,
    ) -> Result<CallToolResult, ErrorData> {
        self.edit(&params.document_id, |doc| {
            doc.remove_list_formatting(params.paragraph_index)
        })
        .await?;
        helpers::json_result(json!({ "paragraph_index": params.paragraph_index }))
    }

    #[tool(description = "List the items of the list containing a paragraph, or every list item.")]
    async fn get_list_items(
        &self,
        Parameters(params): Parameters<ListItemsParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let items = self
            .read(&params.document_id, |doc| match params.paragraph_index {
                Some(index) => doc.list_items(index),
                None => Ok(doc.all_list_items()),
            })
            .await?;
        helpers::json_result(items)
    }

    #[tool(description = "Move a list item one level deeper. Returns the new level.")]
    async fn indent_list_item(
        &self,
        Parameters(params): Parameters<ParagraphIndexParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let level = self
            .edit(&params.document_id, |doc| doc.indent_list_item(params.paragraph_index))
            .await?;
        helpers::json_result(json!({ "level": level }))
    }

    #[tool(description = "Move a list item one level up. Returns the new level.")]
    async fn outdent_list_item(
        &self,
        Parameters(params): Parameters<ParagraphIndexParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let level = self
            .edit(&params.document_id, |doc| doc.outdent_list_item(params.paragraph_index))
            .await?;
        helpers::json_result(json!({ "level": level }))
    }

    #[tool(description = "Set a list item's nesting level (0-8).")]
    async fn set_list_level(
        &self,
        Parameters(params): Parameters<ListLevelParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let level = self
            .edit(&params.document_id, |doc| {
                doc.set_list_level(params.paragraph_index, params.level)
            })
            .await?;
        helpers::json_result(json!({ "level": level }))
    }

    #[tool(description = "Switch the list containing a paragraph between bullet and numbered. Returns items changed.")]
    async fn change_list_type(
        &self,
        Parameters(params): Parameters<ListTypeParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let kind = helpers::parse::<ListKind>(&params.list_type)?;
        let changed = self
            .edit(&params.document_id, |doc| doc.change_list_type(params.paragraph_index, kind))
            .await?;
        helpers::json_result(json!({ "changed_items": changed }))
    }
}
