use axum::Router;
use axum::extract::{Json, Path, State};
use axum::http::StatusCode;
use axum::routing::{delete, get, post, put};
use docx_core::editor::{CellRange, TableInfo};
use serde::Deserialize;
use serde_json::{Value, json};
use surrealdb::Connection;

use super::non_blank;
use crate::{ApiError, ApiJson, AppState};

pub(super) fn routes<C>() -> Router<AppState<C>>
where
    C: Connection + Send + Sync + 'static,
{
    Router::new()
        .route(
            "/documents/:document_id/tables",
            get(list_tables::<C>).post(add_table::<C>),
        )
        .route(
            "/documents/:document_id/tables/:table",
            get(get_table::<C>).delete(delete_table::<C>),
        )
        .route(
            "/documents/:document_id/tables/:table/cells/:row/:col",
            get(get_cell::<C>).put(set_cell::<C>),
        )
        .route("/documents/:document_id/tables/:table/rows", post(add_row::<C>))
        .route(
            "/documents/:document_id/tables/:table/rows/:row",
            delete(delete_row::<C>),
        )
        .route(
            "/documents/:document_id/tables/:table/columns",
            post(add_column::<C>),
        )
        .route(
            "/documents/:document_id/tables/:table/columns/:col",
            delete(delete_column::<C>),
        )
        .route(
            "/documents/:document_id/tables/:table/columns/:col/width",
            put(set_column_width::<C>),
        )
        .route("/documents/:document_id/tables/:table/merge", post(merge_cells::<C>))
        .route("/documents/:document_id/tables/:table/style", put(set_table_style::<C>))
        .route(
            "/documents/:document_id/tables/:table/borders",
            put(set_table_borders::<C>),
        )
}

#[derive(Debug, Deserialize)]
struct AddTableBody {
    rows: usize,
    cols: usize,
    style: Option<String>,
    /// Row-major cell text.
    data: Option<Vec<Vec<String>>>,
    after_paragraph: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct CellBody {
    text: String,
}

#[derive(Debug, Deserialize)]
struct AddRowBody {
    values: Option<Vec<String>>,
    position: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct AddColumnBody {
    /// Inches.
    width: Option<f64>,
    values: Option<Vec<String>>,
    position: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct WidthBody {
    inches: f64,
}

#[derive(Debug, Deserialize)]
struct StyleBody {
    style: String,
}

async fn list_tables<C: Connection>(
    State(state): State<AppState<C>>,
    Path(document_id): Path<String>,
) -> Result<Json<Vec<TableInfo>>, ApiError> {
    let tables = state.read(&document_id, |doc| Ok(doc.table_infos())).await?;
    Ok(Json(tables))
}

async fn add_table<C: Connection>(
    State(state): State<AppState<C>>,
    Path(document_id): Path<String>,
    ApiJson(body): ApiJson<AddTableBody>,
) -> Result<(StatusCode, Json<TableInfo>), ApiError> {
    let style = non_blank(body.style);
    let table = state
        .edit(&document_id, |doc| {
            let index = doc.add_table(
                body.rows,
                body.cols,
                style.as_deref(),
                body.data.as_deref(),
                body.after_paragraph,
            )?;
            doc.table_info(index)
        })
        .await?;
    Ok((StatusCode::CREATED, Json(table)))
}

async fn get_table<C: Connection>(
    State(state): State<AppState<C>>,
    Path((document_id, table)): Path<(String, usize)>,
) -> Result<Json<TableInfo>, ApiError> {
    let info = state.read(&document_id, |doc| doc.table_info(table)).await?;
    Ok(Json(info))
}

async fn delete_table<C: Connection>(
    State(state): State<AppState<C>>,
    Path((document_id, table)): Path<(String, usize)>,
) -> Result<StatusCode, ApiError> {
    state.edit(&document_id, |doc| doc.delete_table(table)).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn get_cell<C: Connection>(
    State(state): State<AppState<C>>,
    Path((document_id, table, row, col)): Path<(String, usize, usize, usize)>,
) -> Result<Json<Value>, ApiError> {
    let text = state
        .read(&document_id, |doc| doc.cell_text(table, row, col))
        .await?;
    Ok(Json(json!({ "row": row, "col": col, "text": text })))
}

async fn set_cell<C: Connection>(
    State(state): State<AppState<C>>,
    Path((document_id, table, row, col)): Path<(String, usize, usize, usize)>,
    ApiJson(body): ApiJson<CellBody>,
) -> Result<Json<Value>, ApiError> {
    state
        .edit(&document_id, |doc| doc.set_cell(table, row, col, &body.text))
        .await?;
    Ok(Json(json!({ "row": row, "col": col, "text": body.text })))
}

async fn add_row<C: Connection>(
    State(state): State<AppState<C>>,
    Path((document_id, table)): Path<(String, usize)>,
    ApiJson(body): ApiJson<AddRowBody>,
) -> Result<(StatusCode, Json<TableInfo>), ApiError> {
    let info = state
        .edit(&document_id, |doc| {
            doc.add_row(table, body.values.as_deref(), body.position)?;
            doc.table_info(table)
        })
        .await?;
    Ok((StatusCode::CREATED, Json(info)))
}

async fn delete_row<C: Connection>(
    State(state): State<AppState<C>>,
    Path((document_id, table, row)): Path<(String, usize, usize)>,
) -> Result<Json<TableInfo>, ApiError> {
    let info = state
        .edit(&document_id, |doc| {
            doc.delete_row(table, row)?;
            doc.table_info(table)
        })
        .await?;
    Ok(Json(info))
}

async fn add_column<C: Connection>(
    State(state): State<AppState<C>>,
    Path((document_id, table)): Path<(String, usize)>,
    ApiJson(body): ApiJson<AddColumnBody>,
) -> Result<(StatusCode, Json<TableInfo>), ApiError> {
    let info = state
        .edit(&document_id, |doc| {
            doc.add_column(table, body.width, body.values.as_deref(), body.position)?;
            doc.table_info(table)
        })
        .await?;
    Ok((StatusCode::CREATED, Json(info)))
}

async fn delete_column<C: Connection>(
    State(state): State<AppState<C>>,
    Path((document_id, table, col)): Path<(String, usize, usize)>,
) -> Result<Json<TableInfo>, ApiError> {
    let info = state
        .edit(&document_id, |doc| {
            doc.delete_column(table, col)?;
            doc.table_info(table)
        })
        .await?;
    Ok(Json(info))
}

async fn set_column_width<C: Connection>(
    State(state): State<AppState<C>>,
    Path((document_id, table, col)): Path<(String, usize, usize)>,
    ApiJson(body): ApiJson<WidthBody>,
) -> Result<Json<TableInfo>, ApiError> {
    let info = state
        .edit(&document_id, |doc| {
            doc.set_column_width(table, col, body.inches)?;
            doc.table_info(table)
        })
        .await?;
    Ok(Json(info))
}

async fn merge_cells<C: Connection>(
    State(state): State<AppState<C>>,
    Path((document_id, table)): Path<(String, usize)>,
    ApiJson(range): ApiJson<CellRange>,
) -> Result<Json<TableInfo>, ApiError> {
    let info = state
        .edit(&document_id, |doc| {
            doc.merge_cells(table, range)?;
            doc.table_info(table)
        })
        .await?;
    Ok(Json(info))
}

async fn set_table_style<C: Connection>(
    State(state): State<AppState<C>>,
    Path((document_id, table)): Path<(String, usize)>,
    ApiJson(body): ApiJson<StyleBody>,
) -> Result<Json<TableInfo>, ApiError> {
    let info = state
        .edit(&document_id, |doc| {
            doc.set_table_style(table, &body.style)?;
            doc.table_info(table)
        })
        .await?;
    Ok(Json(info))
}

async fn set_table_borders<C: Connection>(
    State(state): State<AppState<C>>,
    Path((document_id, table)): Path<(String, usize)>,
    ApiJson(body): ApiJson<StyleBody>,
) -> Result<Json<TableInfo>, ApiError> {
    let info = state
        .edit(&document_id, |doc| {
            doc.set_table_borders(table, &body.style)?;
            doc.table_info(table)
        })
        .await?;
    Ok(Json(info))
}
