use docx_core::document::{Alignment, StyleType};
use docx_core::editor::{StyleSpec, TextFormat};
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

use super::text::{ParagraphIndexParams, TextFormatParams};
use crate::{DocxMcp, helpers};

/// Parameters for listing styles.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct ListStylesParams {
    pub document_id: String,
    /// paragraph, character, table or numbering.
    pub style_type: Option<String>,
}

/// Parameters for addressing one style.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct StyleNameParams {
    pub document_id: String,
    /// Style name or id.
    pub name: String,
}

/// Parameters for defining a custom style.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct StyleParams {
    pub document_id: String,
    pub name: String,
    /// paragraph (default), character or table.
    pub style_type: Option<String>,
    pub based_on: Option<String>,
    /// Style for the following paragraph.
    pub next: Option<String>,
    #[serde(default)]
    pub format: Option<TextFormatParams>,
    pub alignment: Option<String>,
    /// Points.
    pub space_before: Option<f64>,
    /// Points.
    pub space_after: Option<f64>,
}

/// Parameters for changing an existing style. Absent fields are unchanged.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct UpdateStyleParams {
    pub document_id: String,
    pub name: String,
    pub new_name: Option<String>,
    pub based_on: Option<String>,
    pub next: Option<String>,
    #[serde(default)]
    pub format: Option<TextFormatParams>,
    pub alignment: Option<String>,
    pub space_before: Option<f64>,
    pub space_after: Option<f64>,
}

/// Parameters for applying a style to a paragraph.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct ApplyStyleParams {
    pub document_id: String,
    pub paragraph_index: usize,
    pub name: String,
}

impl StyleParams {
    fn to_spec(&self) -> Result<StyleSpec, ErrorData> {
        Ok(StyleSpec {
            name: self.name.clone(),
            style_type: helpers::parse_opt::<StyleType>(self.style_type.as_deref())?,
            based_on: helpers::non_blank(self.based_on.clone()),
            next: helpers::non_blank(self.next.clone()),
            format: self.format.clone().map(TextFormat::from).unwrap_or_default(),
            alignment: helpers::parse_opt::<Alignment>(self.alignment.as_deref())?,
            space_before: self.space_before,
            space_after: self.space_after,
        })
    }
}

impl UpdateStyleParams {
    fn to_spec(&self) -> Result<StyleSpec, ErrorData> {
        Ok(StyleSpec {
            name: self.new_name.clone().unwrap_or_default(),
            style_type: None,
            based_on: helpers::non_blank(self.based_on.clone()),
            next: helpers::non_blank(self.next.clone()),
            format: self.format.clone().map(TextFormat::from).unwrap_or_default(),
            alignment: helpers::parse_opt::<Alignment>(self.alignment.as_deref())?,
            space_before: self.space_before,
            space_after: self.space_after,
        })
    }
}

#[tool_router(router = tool_router_styles, vis = "pub")]
impl<C: Connection> DocxMcp<C> {
    #[tool(description = "List styles, optionally of one type.")]
    async fn list_styles(
        &self,
        Parameters(params): Parameters<ListStylesParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let style_type = helpers::parse_opt::<StyleType>(params.style_type.as_deref())?;
        let styles = self
            .read(&params.document_id, |doc| Ok(doc.styles_list(style_type)))
            .await?;
        helpers::json_result(styles)
    }

    #[tool(description = "Fetch one style by name or id.")]
    async fn get_style(
        &self,
        Parameters(params): Parameters<StyleNameParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let style = self
            .read(&params.document_id, |doc| doc.style_info(&params.name))
            .await?;
        helpers::json_result(style)
    }

    #[tool(description = "Create a custom style.")]
    async fn create_style(
        &self,
        Parameters(params): Parameters<StyleParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let spec = params.to_spec()?;
        let style = self
            .edit(&params.document_id, |doc| doc.create_style(&spec))
            .await?;
        helpers::json_result(style)
    }

    #[tool(description = "Change an existing style's name, parent, formatting or spacing.")]
    async fn update_style(
        &self,
        Parameters(params): Parameters<UpdateStyleParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let spec = params.to_spec()?;
        let style = self
            .edit(&params.document_id, |doc| doc.update_style(&params.name, &spec))
            .await?;
        helpers::json_result(style)
    }

    #[tool(description = "Delete a custom style. Paragraphs using it fall back to the default style.")]
    async fn delete_style(
        &self,
        Parameters(params): Parameters<StyleNameParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let affected = self
            .edit(&params.document_id, |doc| doc.delete_style(&params.name))
            .await?;
        helpers::json_result(json!({ "deleted": params.name, "affected_paragraphs": affected }))
    }

    #[tool(description = "Apply a paragraph style, or a character style to every run of the paragraph.")]
    async fn apply_style(
        &self,
        Parameters(params): Parameters<ApplyStyleParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let style = self
            .edit(&params.document_id, |doc| {
                doc.apply_style(params.paragraph_index, &params.name)?;
                doc.paragraph_style(params.paragraph_index)
            })
            .await?;
        helpers::json_result(style)
    }

    #[tool(description = "Return the effective paragraph style of a paragraph.")]
    async fn get_paragraph_style(
        &self,
        Parameters(params): Parameters<ParagraphIndexParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let style = self
            .read(&params.document_id, |doc| doc.paragraph_style(params.paragraph_index))
            .await?;
        helpers::json_result(style)
    }
}
