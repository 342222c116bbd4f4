use axum::Router;
use axum::extract::{Json, Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post, put};
use docx_core::document::{ListKind, NumberFormat, StyleType};
use docx_core::editor::{ListItemInfo, StyleInfo, StyleSpec};
use serde::Deserialize;
use serde_json::{Value, json};
use surrealdb::Connection;

use crate::{ApiError, ApiJson, AppState};

pub(super) fn routes<C>() -> Router<AppState<C>>
where
    C: Connection + Send + Sync + 'static,
{
    Router::new()
        .route(
            "/documents/:document_id/lists",
            get(list_items::<C>).post(create_list::<C>),
        )
        .route("/documents/:document_id/lists/items", post(add_list_item::<C>))
        .route(
            "/documents/:document_id/paragraphs/:index/list",
            put(convert_to_list::<C>)
                .patch(change_list_type::<C>)
                .delete(remove_list_formatting::<C>),
        )
        .route(
            "/documents/:document_id/paragraphs/:index/list/level",
            put(set_list_level::<C>),
        )
        .route(
            "/documents/:document_id/paragraphs/:index/list/indent",
            post(indent_list_item::<C>),
        )
        .route(
            "/documents/:document_id/paragraphs/:index/list/outdent",
            post(outdent_list_item::<C>),
        )
        .route(
            "/documents/:document_id/styles",
            get(list_styles::<C>).post(create_style::<C>),
        )
        .route(
            "/documents/:document_id/styles/:style",
            get(get_style::<C>)
                .patch(update_style::<C>)
                .delete(delete_style::<C>),
        )
        .route(
            "/documents/:document_id/paragraphs/:index/style",
            get(paragraph_style::<C>).put(apply_style::<C>),
        )
}

#[derive(Debug, Deserialize)]
struct CreateListBody {
    items: Vec<String>,
    list_type: ListKind,
    number_format: Option<NumberFormat>,
}

#[derive(Debug, Deserialize)]
struct ListItemBody {
    text: String,
    list_type: ListKind,
    #[serde(default)]
    level: u8,
}

#[derive(Debug, Deserialize)]
struct ListTypeBody {
    list_type: ListKind,
}

#[derive(Debug, Deserialize)]
struct LevelBody {
    level: u8,
}

#[derive(Debug, Deserialize)]
struct StylesQuery {
    style_type: Option<StyleType>,
}

#[derive(Debug, Deserialize)]
struct ApplyStyleBody {
    style: String,
}

async fn list_items<C: Connection>(
    State(state): State<AppState<C>>,
    Path(document_id): Path<String>,
) -> Result<Json<Vec<ListItemInfo>>, ApiError> {
    let items = state
        .read(&document_id, |doc| Ok(doc.all_list_items()))
        .await?;
    Ok(Json(items))
}

async fn create_list<C: Connection>(
    State(state): State<AppState<C>>,
    Path(document_id): Path<String>,
    ApiJson(body): ApiJson<CreateListBody>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let indexes = state
        .edit(&document_id, |doc| {
            doc.create_list(&body.items, body.list_type, body.number_format)
        })
        .await?;
    Ok((StatusCode::CREATED, Json(json!({ "paragraph_indexes": indexes }))))
}

async fn add_list_item<C: Connection>(
    State(state): State<AppState<C>>,
    Path(document_id): Path<String>,
    ApiJson(body): ApiJson<ListItemBody>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let index = state
        .edit(&document_id, |doc| {
            doc.add_list_item(&body.text, body.list_type, body.level)
        })
        .await?;
    Ok((StatusCode::CREATED, Json(json!({ "paragraph_index": index }))))
}

async fn convert_to_list<C: Connection>(
    State(state): State<AppState<C>>,
    Path((document_id, index)): Path<(String, usize)>,
    ApiJson(body): ApiJson<ListTypeBody>,
) -> Result<Json<Value>, ApiError> {
    let num_id = state
        .edit(&document_id, |doc| doc.convert_to_list(index, body.list_type))
        .await?;
    Ok(Json(json!({ "paragraph_index": index, "num_id": num_id })))
}

async fn change_list_type<C: Connection>(
    State(state): State<AppState<C>>,
    Path((document_id, index)): Path<(String, usize)>,
    ApiJson(body): ApiJson<ListTypeBody>,
) -> Result<Json<Value>, ApiError> {
    let changed = state
        .edit(&document_id, |doc| doc.change_list_type(index, body.list_type))
        .await?;
    Ok(Json(json!({ "changed_items": changed })))
}

async fn remove_list_formatting<C: Connection>(
    State(state): State<AppState<C>>,
    Path((document_id, index)): Path<(String, usize)>,
) -> Result<StatusCode, ApiError> {
    state
        .edit(&document_id, |doc| doc.remove_list_formatting(index))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn set_list_level<C: Connection>(
    State(state): State<AppState<C>>,
    Path((document_id, index)): Path<(String, usize)>,
    ApiJson(body): ApiJson<LevelBody>,
) -> Result<Json<Value>, ApiError> {
    let level = state
        .edit(&document_id, |doc| doc.set_list_level(index, body.level))
        .await?;
    Ok(Json(json!({ "paragraph_index": index, "level": level })))
}

async fn indent_list_item<C: Connection>(
    State(state): State<AppState<C>>,
    Path((document_id, index)): Path<(String, usize)>,
) -> Result<Json<Value>, ApiError> {
    let level = state
        .edit(&document_id, |doc| doc.indent_list_item(index))
        .await?;
    Ok(Json(json!({ "paragraph_index": index, "level": level })))
}

async fn outdent_list_item<C: Connection>(
    State(state): State<AppState<C>>,
    Path((document_id, index)): Path<(String, usize)>,
) -> Result<Json<Value>, ApiError> {
    let level = state
        .edit(&document_id, |doc| doc.outdent_list_item(index))
        .await?;
    Ok(Json(json!({ "paragraph_index": index, "level": level })))
}

async fn list_styles<C: Connection>(
    State(state): State<AppState<C>>,
    Path(document_id): Path<String>,
    Query(query): Query<StylesQuery>,
) -> Result<Json<Vec<StyleInfo>>, ApiError> {
    let styles = state
        .read(&document_id, |doc| Ok(doc.styles_list(query.style_type)))
        .await?;
    Ok(Json(styles))
}

async fn create_style<C: Connection>(
    State(state): State<AppState<C>>,
    Path(document_id): Path<String>,
    ApiJson(spec): ApiJson<StyleSpec>,
) -> Result<(StatusCode, Json<StyleInfo>), ApiError> {
    let style = state
        .edit(&document_id, |doc| doc.create_style(&spec))
        .await?;
    Ok((StatusCode::CREATED, Json(style)))
}

async fn get_style<C: Connection>(
    State(state): State<AppState<C>>,
    Path((document_id, name)): Path<(String, String)>,
) -> Result<Json<StyleInfo>, ApiError> {
    let style = state.read(&document_id, |doc| doc.style_info(&name)).await?;
    Ok(Json(style))
}

async fn update_style<C: Connection>(
    State(state): State<AppState<C>>,
    Path((document_id, name)): Path<(String, String)>,
    ApiJson(spec): ApiJson<StyleSpec>,
) -> Result<Json<StyleInfo>, ApiError> {
    let style = state
        .edit(&document_id, |doc| doc.update_style(&name, &spec))
        .await?;
    Ok(Json(style))
}

async fn delete_style<C: Connection>(
    State(state): State<AppState<C>>,
    Path((document_id, name)): Path<(String, String)>,
) -> Result<Json<Value>, ApiError> {
    let reset = state
        .edit(&document_id, |doc| doc.delete_style(&name))
        .await?;
    Ok(Json(json!({ "deleted": name, "paragraphs_reset": reset })))
}

async fn paragraph_style<C: Connection>(
    State(state): State<AppState<C>>,
    Path((document_id, index)): Path<(String, usize)>,
) -> Result<Json<Option<StyleInfo>>, ApiError> {
    let style = state
        .read(&document_id, |doc| doc.paragraph_style(index))
        .await?;
    Ok(Json(style))
}

async fn apply_style<C: Connection>(
    State(state): State<AppState<C>>,
    Path((document_id, index)): Path<(String, usize)>,
    ApiJson(body): ApiJson<ApplyStyleBody>,
) -> Result<Json<Value>, ApiError> {
    state
        .edit(&document_id, |doc| doc.apply_style(index, &body.style))
        .await?;
    Ok(Json(json!({ "paragraph_index": index, "style": body.style })))
}
