use rmcp::{
    ErrorData,
    model::{CallToolResult, Content},
    schemars,
    tool,
    tool_router,
};
use serde::{Deserialize, Serialize};
use surrealdb::Connection;

use crate::DocxMcp;

/// Tool groups and their commands, as returned by `help`.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct HelpCommands {
    pub groups: Vec<CommandGroup>,
}

#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct CommandGroup {
    pub name: String,
    pub commands: Vec<String>,
}

fn group(name: &str, commands: &[&str]) -> CommandGroup {
    CommandGroup {
        name: name.to_string(),
        commands: commands.iter().map(ToString::to_string).collect(),
    }
}

impl Default for HelpCommands {
    fn default() -> Self {
        Self {
            groups: vec![
                group("context", &["help", "editing_help", "health"]),
                group(
                    "documents",
                    &[
                        "create_document",
                        "get_document",
                        "list_documents",
                        "search_documents",
                        "update_document",
                        "delete_document",
                        "get_document_info",
                        "set_document_properties",
                        "get_document_content",
                        "replace_document_content",
                        "close_document",
                        "list_open_documents",
                        "list_audit",
                    ],
                ),
                group(
                    "templates",
                    &[
                        "create_template",
                        "list_templates",
                        "list_template_categories",
                        "get_template",
                        "delete_template",
                    ],
                ),
                group(
                    "text",
                    &[
                        "get_paragraphs",
                        "get_paragraph",
                        "get_text",
                        "add_paragraph",
                        "update_paragraph",
                        "delete_paragraph",
                        "add_heading",
                        "add_text_run",
                        "insert_text",
                        "format_text",
                        "format_paragraph",
                        "find_text",
                        "regex_search",
                        "replace_text",
                        "regex_replace",
                        "highlight_text",
                        "add_page_break",
                    ],
                ),
                group(
                    "tables",
                    &[
                        "list_tables",
                        "get_table",
                        "add_table",
                        "delete_table",
                        "get_cell",
                        "set_cell",
                        "add_row",
                        "add_column",
                        "delete_row",
                        "delete_column",
                        "merge_cells",
                        "set_table_style",
                        "set_column_width",
                        "set_table_borders",
                    ],
                ),
                group(
                    "lists",
                    &[
                        "create_list",
                        "add_list_item",
                        "convert_to_list",
                        "remove_list_formatting",
                        "get_list_items",
                        "indent_list_item",
                        "outdent_list_item",
                        "set_list_level",
                        "change_list_type",
                    ],
                ),
                group(
                    "styles",
                    &[
                        "list_styles",
                        "get_style",
                        "create_style",
                        "update_style",
                        "delete_style",
                        "apply_style",
                        "get_paragraph_style",
                    ],
                ),
                group(
                    "media",
                    &["list_images", "get_image", "insert_image", "resize_image", "delete_image"],
                ),
                group(
                    "layout",
                    &[
                        "list_sections",
                        "set_margins",
                        "set_orientation",
                        "set_page_size",
                        "add_section",
                        "set_header",
                        "set_footer",
                        "get_header_footer",
                        "add_page_numbers",
                    ],
                ),
                group(
                    "navigation",
                    &[
                        "get_outline",
                        "add_table_of_contents",
                        "add_bookmark",
                        "list_bookmarks",
                        "delete_bookmark",
                        "add_hyperlink",
                        "list_hyperlinks",
                    ],
                ),
                group(
                    "comments",
                    &[
                        "add_comment",
                        "list_comments",
                        "get_document_comments",
                        "get_comment",
                        "update_comment",
                        "reply_to_comment",
                        "resolve_comment",
                        "reopen_comment",
                        "delete_comment",
                    ],
                ),
                group(
                    "versions",
                    &[
                        "list_versions",
                        "get_version",
                        "create_version",
                        "restore_version",
                        "compare_versions",
                        "get_version_content",
                        "delete_version",
                    ],
                ),
                group(
                    "revisions",
                    &[
                        "set_tracking",
                        "propose_revision",
                        "list_revisions",
                        "get_revision",
                        "accept_revision",
                        "reject_revision",
                        "accept_all_revisions",
                        "reject_all_revisions",
                    ],
                ),
                group("batch", &["execute_batch", "validate_batch"]),
                group(
                    "export",
                    &[
                        "list_export_formats",
                        "export_document",
                        "start_export",
                        "get_export_job",
                        "list_export_jobs",
                        "get_export_file",
                    ],
                ),
            ],
        }
    }
}

#[tool_router(router = tool_router_context, vis = "pub")]
impl<C: Connection> DocxMcp<C> {
    #[tool(description = "List the MCP commands grouped by area.")]
    async fn help(&self) -> Result<CallToolResult, ErrorData> {
        Ok(CallToolResult::success(vec![Content::json(HelpCommands::default())?]))
    }

    #[tool(description = "Explains indexes, formatting values and how edits are saved.")]
    async fn editing_help(&self) -> Result<CallToolResult, ErrorData> {
        Ok(CallToolResult::success(vec![Content::text(
r"
1.  Indexes are zero-based.
    - paragraph_index counts top-level paragraphs in body order; tables are not paragraphs.
    - run_index counts text runs inside one paragraph (see get_paragraph).
    - table_index, row and column count tables and cells; section_index counts sections.
    - Deleting an item shifts the indexes that follow it.
2.  Every edit is written back to the stored .docx immediately. A failed edit leaves the document unchanged.
    Edits do not create versions; call create_version to snapshot.
3.  Formatting values:
    - alignment: left, center, right, justify.
    - colors: hex RGB such as FF0000 (a leading # is accepted).
    - highlight: yellow, green, cyan, magenta, blue, red, darkBlue, darkCyan, darkGreen,
      darkMagenta, darkRed, darkYellow, darkGray, lightGray, black, white.
    - font_size and spacing are in points; margins, indents and image sizes are in inches.
    - list_type: bullet or numbered; number_format: decimal, lowerLetter, upperLetter, lowerRoman, upperRoman.
4.  Styles are referenced by id (e.g. Heading1, Normal). Built-in styles cannot be deleted.
5.  Review workflow:
    - Comments anchor to a paragraph. Replies inherit the anchor; deleting a comment removes its replies.
    - Revisions need tracking on (set_tracking). A proposed revision changes nothing until accepted.
      Accepting or rejecting is allowed once.
6.  Binary content (documents, images, docx exports, version downloads) is base64. A data: URI prefix is accepted.
7.  Batches: execute_batch takes a list of {operation, params} steps and saves once. A failed step is skipped;
    with stop_on_error the first failure discards the whole batch. validate_batch runs the list on a copy.
    regex_replace accepts $1 / ${name} group references in the replacement.
"
        )]))
    }
}
