use docx_core::document::Alignment;
use docx_core::editor::{ParagraphFormatting, ParagraphUpdate, TextFormat};
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

/// Parameters for character formatting. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize, schemars::JsonSchema)]
pub struct TextFormatParams {
    pub bold: Option<bool>,
    pub italic: Option<bool>,
    pub underline: Option<bool>,
    pub strike: Option<bool>,
    pub font_name: Option<String>,
    /// Points, 6 to 144.
    pub font_size: Option<f64>,
    /// Hex color such as FF0000.
    pub color: Option<String>,
    /// Highlight name such as yellow or darkBlue.
    pub highlight: Option<String>,
    pub superscript: Option<bool>,
    pub subscript: Option<bool>,
    /// Character style name.
    pub style: Option<String>,
}

impl From<TextFormatParams> for TextFormat {
    fn from(params: TextFormatParams) -> Self {
        Self {
            bold: params.bold,
            italic: params.italic,
            underline: params.underline,
            strike: params.strike,
            font_name: params.font_name,
            font_size: params.font_size,
            color: params.color,
            highlight: params.highlight,
            superscript: params.superscript,
            subscript: params.subscript,
            style: params.style,
        }
    }
}

/// Parameters for addressing one paragraph.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct ParagraphIndexParams {
    pub document_id: String,
    pub paragraph_index: usize,
}

/// Parameters for adding a paragraph at the end or at a position.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct AddParagraphParams {
    pub document_id: String,
    pub text: String,
    pub style: Option<String>,
    /// left, center, right, justify or distribute.
    pub alignment: Option<String>,
    /// Insert before this paragraph index instead of appending.
    pub position: Option<usize>,
}

/// Parameters for updating a paragraph.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct UpdateParagraphParams {
    pub document_id: String,
    pub paragraph_index: usize,
    pub text: Option<String>,
    pub style: Option<String>,
    pub alignment: Option<String>,
}

/// Parameters for adding a heading.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct AddHeadingParams {
    pub document_id: String,
    pub text: String,
    /// 0 for Title, 1 to 9 for Heading 1-9.
    pub level: u8,
}

/// Parameters for appending a text run.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct AddRunParams {
    pub document_id: String,
    pub paragraph_index: usize,
    pub text: String,
    #[serde(default)]
    pub format: Option<TextFormatParams>,
}

/// Parameters for inserting text into a paragraph.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct InsertTextParams {
    pub document_id: String,
    pub paragraph_index: usize,
    /// Character offset within the paragraph text.
    pub offset: usize,
    pub text: String,
    #[serde(default)]
    pub format: Option<TextFormatParams>,
}

/// Parameters for formatting one run, a character range, or the whole paragraph.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct FormatTextParams {
    pub document_id: String,
    pub paragraph_index: usize,
    pub run_index: Option<usize>,
    pub start: Option<usize>,
    pub end: Option<usize>,
    pub format: TextFormatParams,
}

/// Parameters for formatting a paragraph.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct FormatParagraphParams {
    pub document_id: String,
    pub paragraph_index: usize,
    pub alignment: Option<String>,
    /// Points.
    pub space_before: Option<f64>,
    /// Points.
    pub space_after: Option<f64>,
    /// Multiple of single spacing.
    pub line_spacing: Option<f64>,
    /// Inches.
    pub left_indent: Option<f64>,
    /// Inches.
    pub right_indent: Option<f64>,
    /// Inches; negative for a hanging indent.
    pub first_line_indent: Option<f64>,
    pub keep_with_next: Option<bool>,
    pub page_break_before: Option<bool>,
}

/// Parameters for finding text.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct FindTextParams {
    pub document_id: String,
    pub query: String,
    #[serde(default)]
    pub case_sensitive: bool,
    #[serde(default)]
    pub whole_word: bool,
}

/// Parameters for a regular-expression search.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct RegexSearchParams {
    pub document_id: String,
    pub pattern: String,
    #[serde(default)]
    pub case_sensitive: bool,
}

/// Parameters for replacing text.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct ReplaceTextParams {
    pub document_id: String,
    pub find: String,
    pub replace: String,
    #[serde(default)]
    pub case_sensitive: bool,
    #[serde(default)]
    pub whole_word: bool,
}

/// Parameters for a regular-expression replacement.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct RegexReplaceParams {
    pub document_id: String,
    pub pattern: String,
    /// Replacement text; `$1` or `$name` insert capture groups.
    pub replacement: String,
    #[serde(default)]
    pub case_sensitive: bool,
}

/// Parameters for highlighting matching text.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct HighlightTextParams {
    pub document_id: String,
    pub query: String,
    pub color: String,
    #[serde(default)]
    pub case_sensitive: bool,
}

#[tool_router(router = tool_router_text, vis = "pub")]
impl<C: Connection> DocxMcp<C> {
    #[tool(description = "List top-level paragraphs with text, style and alignment.")]
    async fn get_paragraphs(
        &self,
        Parameters(params): Parameters<DocumentIdParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let paragraphs = self
            .read(&params.document_id, |doc| Ok(doc.paragraph_infos()))
            .await?;
        helpers::json_result(paragraphs)
    }

    #[tool(description = "Fetch one paragraph with its runs and their formatting.")]
    async fn get_paragraph(
        &self,
        Parameters(params): Parameters<ParagraphIndexParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let paragraph = self
            .read(&params.document_id, |doc| doc.paragraph_info(params.paragraph_index))
            .await?;
        helpers::json_result(paragraph)
    }

    #[tool(description = "Return the document body as plain text, one line per paragraph.")]
    async fn get_text(
        &self,
        Parameters(params): Parameters<DocumentIdParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let text = self.read(&params.document_id, |doc| Ok(doc.all_text())).await?;
        Ok(helpers::text_result(text))
    }

    #[tool(description = "Add a paragraph at the end, or before `position`. Returns the paragraph index.")]
    async fn add_paragraph(
        &self,
        Parameters(params): Parameters<AddParagraphParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let alignment = helpers::parse_opt::<Alignment>(params.alignment.as_deref())?;
        let style = helpers::non_blank(params.style);
        let index = self
            .edit(&params.document_id, |doc| match params.position {
                Some(position) => doc.insert_paragraph(position, &params.text, style.as_deref(), alignment),
                None => doc.add_paragraph(&params.text, style.as_deref(), alignment),
            })
            .await?;
        helpers::json_result(json!({ "paragraph_index": index }))
    }

    #[tool(description = "Replace a paragraph's text, style or alignment.")]
    async fn update_paragraph(
        &self,
        Parameters(params): Parameters<UpdateParagraphParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let update = ParagraphUpdate {
            text: params.text,
            style: helpers::non_blank(params.style),
            alignment: helpers::parse_opt::<Alignment>(params.alignment.as_deref())?,
        };
        let paragraph = self
            .edit(&params.document_id, |doc| {
                doc.update_paragraph(params.paragraph_index, &update)?;
                doc.paragraph_info(params.paragraph_index)
            })
            .await?;
        helpers::json_result(paragraph)
    }

    #[tool(description = "Delete a paragraph. Returns its text.")]
    async fn delete_paragraph(
        &self,
        Parameters(params): Parameters<ParagraphIndexParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let removed = self
            .edit(&params.document_id, |doc| doc.delete_paragraph(params.paragraph_index))
            .await?;
        helpers::json_result(json!({ "deleted_text": removed }))
    }

    #[tool(description = "Add a heading (level 0 is Title, 1-9 are Heading 1-9).")]
    async fn add_heading(
        &self,
        Parameters(params): Parameters<AddHeadingParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let index = self
            .edit(&params.document_id, |doc| doc.add_heading(&params.text, params.level))
            .await?;
        helpers::json_result(json!({ "paragraph_index": index }))
    }

    #[tool(description = "Append a formatted run of text to a paragraph. Returns the run index.")]
    async fn add_text_run(
        &self,
        Parameters(params): Parameters<AddRunParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let format = TextFormat::from(params.format.unwrap_or_default());
        let run_index = self
            .edit(&params.document_id, |doc| {
                doc.add_run(params.paragraph_index, &params.text, &format)
            })
            .await?;
        helpers::json_result(json!({ "run_index": run_index }))
    }

    #[tool(description = "Insert text at a character offset inside a paragraph.")]
    async fn insert_text(
        &self,
        Parameters(params): Parameters<InsertTextParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let format = params.format.map(TextFormat::from);
        let paragraph = self
            .edit(&params.document_id, |doc| {
                doc.insert_text(params.paragraph_index, params.offset, &params.text, format.as_ref())?;
                doc.paragraph_info(params.paragraph_index)
            })
            .await?;
        helpers::json_result(paragraph)
    }

    #[tool(description = "Format one run (run_index), a character range (start, end) or the whole paragraph.")]
    async fn format_text(
        &self,
        Parameters(params): Parameters<FormatTextParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let format = TextFormat::from(params.format);
        let index = params.paragraph_index;
        let runs = match (params.run_index, params.start, params.end) {
            (Some(run_index), _, _) => {
                self.edit(&params.document_id, |doc| doc.format_run(index, run_index, &format).map(|()| 1))
                    .await?
            }
            (None, Some(start), Some(end)) => {
                self.edit(&params.document_id, |doc| doc.format_text_range(index, start, end, &format))
                    .await?
            }
            (None, None, None) => {
                self.edit(&params.document_id, |doc| doc.format_paragraph_text(index, &format))
                    .await?
            }
            _ => return Err(helpers::invalid_params("start and end must be given together")),
        };
        helpers::json_result(json!({ "formatted_runs": runs }))
    }

    #[tool(description = "Set paragraph layout: alignment, spacing (points), indents (inches), keep-with-next, page break before.")]
    async fn format_paragraph(
        &self,
        Parameters(params): Parameters<FormatParagraphParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let formatting = ParagraphFormatting {
            alignment: helpers::parse_opt::<Alignment>(params.alignment.as_deref())?,
            space_before: params.space_before,
            space_after: params.space_after,
            line_spacing: params.line_spacing,
            left_indent: params.left_indent,
            right_indent: params.right_indent,
            first_line_indent: params.first_line_indent,
            keep_with_next: params.keep_with_next,
            page_break_before: params.page_break_before,
        };
        let paragraph = self
            .edit(&params.document_id, |doc| {
                doc.format_paragraph(params.paragraph_index, &formatting)?;
                doc.paragraph_info(params.paragraph_index)
            })
            .await?;
        helpers::json_result(paragraph)
    }

    #[tool(description = "Find literal text. Returns paragraph index, character offset and length of each match.")]
    async fn find_text(
        &self,
        Parameters(params): Parameters<FindTextParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let matches = self
            .read(&params.document_id, |doc| {
                doc.find_text(&params.query, params.case_sensitive, params.whole_word)
            })
            .await?;
        helpers::json_result(matches)
    }

    #[tool(description = "Search paragraphs with a regular expression.")]
    async fn regex_search(
        &self,
        Parameters(params): Parameters<RegexSearchParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let matches = self
            .read(&params.document_id, |doc| {
                doc.regex_search(&params.pattern, params.case_sensitive)
            })
            .await?;
        helpers::json_result(matches)
    }

    #[tool(description = "Replace every occurrence of literal text. Returns the number of replacements.")]
    async fn replace_text(
        &self,
        Parameters(params): Parameters<ReplaceTextParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let replaced = self
            .edit(&params.document_id, |doc| {
                doc.replace_text(&params.find, &params.replace, params.case_sensitive, params.whole_word)
            })
            .await?;
        helpers::json_result(json!({ "replacements": replaced }))
    }

    #[tool(description = "Replace every regular-expression match, including inside tables. $1 or $name in the replacement insert capture groups. Returns the number of replacements.")]
    async fn regex_replace(
        &self,
        Parameters(params): Parameters<RegexReplaceParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let replaced = self
            .edit(&params.document_id, |doc| {
                doc.regex_replace(&params.pattern, &params.replacement, params.case_sensitive)
            })
            .await?;
        helpers::json_result(json!({ "replacements": replaced }))
    }

    #[tool(description = "Highlight every occurrence of literal text with a highlight color.")]
    async fn highlight_text(
        &self,
        Parameters(params): Parameters<HighlightTextParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let highlighted = self
            .edit(&params.document_id, |doc| {
                doc.highlight_text(&params.query, &params.color, params.case_sensitive)
            })
            .await?;
        helpers::json_result(json!({ "highlighted": highlighted }))
    }

    #[tool(description = "Append a page break. Returns the index of the paragraph holding it.")]
    async fn add_page_break(
        &self,
        Parameters(params): Parameters<DocumentIdParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let index = self
            .edit(&params.document_id, |doc| Ok(doc.add_page_break()))
            .await?;
        helpers::json_result(json!({ "paragraph_index": index }))
    }
}
