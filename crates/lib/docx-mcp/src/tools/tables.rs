use docx_core::editor::CellRange;
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

/// Parameters for addressing one table.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct TableIndexParams {
    pub document_id: String,
    pub table_index: usize,
}

/// Parameters for adding a table.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct AddTableParams {
    pub document_id: String,
    pub rows: usize,
    pub cols: usize,
    /// Table style name such as "Table Grid".
    pub style: Option<String>,
    /// Initial cell text, row by row.
    pub data: Option<Vec<Vec<String>>>,
    /// Place the table after this paragraph instead of at the end.
    pub after_paragraph: Option<usize>,
}

/// Parameters for reading a table cell.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct CellParams {
    pub document_id: String,
    pub table_index: usize,
    pub row: usize,
    pub col: usize,
}

/// Parameters for writing a table cell.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct SetCellParams {
    pub document_id: String,
    pub table_index: usize,
    pub row: usize,
    pub col: usize,
    pub text: String,
}

/// Parameters for adding a table row.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct AddRowParams {
    pub document_id: String,
    pub table_index: usize,
    pub values: Option<Vec<String>>,
    /// Insert before this row instead of appending.
    pub position: Option<usize>,
}

/// Parameters for adding a table column.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct AddColumnParams {
    pub document_id: String,
    pub table_index: usize,
    /// Inches.
    pub width: Option<f64>,
    pub values: Option<Vec<String>>,
    pub position: Option<usize>,
}

/// Parameters for deleting a table row.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct RowParams {
    pub document_id: String,
    pub table_index: usize,
    pub row: usize,
}

/// Parameters for deleting a table column.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct ColumnParams {
    pub document_id: String,
    pub table_index: usize,
    pub col: usize,
}

/// Parameters for merging the inclusive rectangle of cells.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct MergeCellsParams {
    pub document_id: String,
    pub table_index: usize,
    pub start_row: usize,
    pub start_col: usize,
    pub end_row: usize,
    pub end_col: usize,
}

/// Parameters for styling a table.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct TableStyleParams {
    pub document_id: String,
    pub table_index: usize,
    pub style: String,
}

/// Parameters for setting a column width.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct ColumnWidthParams {
    pub document_id: String,
    pub table_index: usize,
    pub col: usize,
    /// Inches.
    pub width: f64,
}

/// Parameters for setting table borders.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct TableBordersParams {
    pub document_id: String,
    pub table_index: usize,
    /// single, double, dotted, dashed, thick or none.
    pub style: String,
}

#[tool_router(router = tool_router_tables, vis = "pub")]
impl<C: Connection> DocxMcp<C> {
    #[tool(description = "List tables with their dimensions, style and cell text.")]
    async fn list_tables(
        &self,
        Parameters(params): Parameters<DocumentIdParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let tables = self.read(&params.document_id, |doc| Ok(doc.table_infos())).await?;
        helpers::json_result(tables)
    }

    #[tool(description = "Fetch a table's dimensions and cell text, row by row.")]
    async fn get_table(
        &self,
        Parameters(params): Parameters<TableIndexParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let table = self
            .read(&params.document_id, |doc| doc.table_info(params.table_index))
            .await?;
        helpers::json_result(table)
    }

    #[tool(description = "Add a table at the end or after a paragraph, optionally filled with data. Returns the table index.")]
    async fn add_table(
        &self,
        Parameters(params): Parameters<AddTableParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let style = helpers::non_blank(params.style);
        let index = self
            .edit(&params.document_id, |doc| {
                doc.add_table(
                    params.rows,
                    params.cols,
                    style.as_deref(),
                    params.data.as_deref(),
                    params.after_paragraph,
                )
            })
            .await?;
        helpers::json_result(json!({ "table_index": index }))
    }

    #[tool(description = "Delete a table.")]
    async fn delete_table(
        &self,
        Parameters(params): Parameters<TableIndexParams>,
    ) -> Result<CallToolResult, ErrorData> {
        self.edit(&params.document_id, |doc| doc.delete_table(params.table_index))
            .await?;
        helpers::json_result(json!({ "deleted_table": params.table_index }))
    }

    #[tool(description = "Read the text of one cell.")]
    async fn get_cell(
        &self,
        Parameters(params): Parameters<CellParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let text = self
            .read(&params.document_id, |doc| {
                doc.cell_text(params.table_index, params.row, params.col)
            })
            .await?;
        Ok(helpers::text_result(text))
    }

    #[tool(description = "Replace the text of one cell.")]
    async fn set_cell(
        &self,
        Parameters(params): Parameters<SetCellParams>,
    ) -> Result<CallToolResult, ErrorData> {
        self.edit(&params.document_id, |doc| {
            doc.set_cell(params.table_index, params.row, params.col, &params.text)
        })
        .await?;
        helpers::json_result(json!({ "row": params.row, "col": params.col, "text": params.text }))
    }

    #[tool(description = "Add a row, optionally with values and at a position. Returns the row index.")]
    async fn add_row(
        &self,
        Parameters(params): Parameters<AddRowParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let row = self
            .edit(&params.document_id, |doc| {
                doc.add_row(params.table_index, params.values.as_deref(), params.position)
            })
            .await?;
        helpers::json_result(json!({ "row": row }))
    }

    #[tool(description = "Add a column, optionally with width (inches), values and a position. Returns the column index.")]
    async fn add_column(
        &self,
        Parameters(params): Parameters<AddColumnParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let col = self
            .edit(&params.document_id, |doc| {
                doc.add_column(params.table_index, params.width, params.values.as_deref(), params.position)
            })
            .await?;
        helpers::json_result(json!({ "col": col }))
    }

    #[tool(description = "Delete a row. The last remaining row cannot be deleted.")]
    async fn delete_row(
        &self,
        Parameters(params): Parameters<RowParams>,
    ) -> Result<CallToolResult, ErrorData> {
        self.edit(&params.document_id, |doc| doc.delete_row(params.table_index, params.row))
            .await?;
        helpers::json_result(json!({ "deleted_row": params.row }))
    }

    #[tool(description = "Delete a column. The last remaining column cannot be deleted.")]
    async fn delete_column(
        &self,
        Parameters(params): Parameters<ColumnParams>,
    ) -> Result<CallToolResult, ErrorData> {
        self.edit(&params.document_id, |doc| doc.delete_column(params.table_index, params.col))
            .await?;
        helpers::json_result(json!({ "deleted_col": params.col }))
    }

    #[tool(description = "Merge a rectangle of cells; the top-left cell keeps the combined text.")]
    async fn merge_cells(
        &self,
        Parameters(params): Parameters<MergeCellsParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let range = CellRange {
            start_row: params.start_row,
            start_col: params.start_col,
            end_row: params.end_row,
            end_col: params.end_col,
        };
        let info = self
            .edit(&params.document_id, |doc| {
                doc.merge_cells(params.table_index, range)?;
                doc.table_info(params.table_index)
            })
            .await?;
        helpers::json_result(info)
    }

    #[tool(description = "Apply a table style.")]
    async fn set_table_style(
        &self,
        Parameters(params): Parameters<TableStyleParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let info = self
            .edit(&params.document_id, |doc| {
                doc.set_table_style(params.table_index, &params.style)?;
                doc.table_info(params.table_index)
            })
            .await?;
        helpers::json_result(info)
    }

    #[tool(description = "Set a column width in inches.")]
    async fn set_column_width(
        &self,
        Parameters(params): Parameters<ColumnWidthParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let info = self
            .edit(&params.document_id, |doc| {
                doc.set_column_width(params.table_index, params.col, params.width)?;
                doc.table_info(params.table_index)
            })
            .await?;
        helpers::json_result(info)
    }

    #[tool(description = "Set the border style of every cell edge in a table.")]
    async fn set_table_borders(
        &self,
        Parameters(params): Parameters<TableBordersParams>,
    ) -> Result<CallToolResult, ErrorData> {
        self.edit(&params.document_id, |doc| {
            doc.set_table_borders(params.table_index, &params.style)
        })
        .await?;
        helpers::json_result(json!({ "table_index": params.table_index, "borders": params.style }))
    }
}
