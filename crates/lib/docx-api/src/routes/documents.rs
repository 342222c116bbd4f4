use axum::Router;
use axum::body::Bytes;
use axum::extract::{Json, Path, Query, State};
use axum::http::StatusCode;
use axum::response::Response;
use axum::routing::{get, post};
use docx_core::control::{CreateDocumentRequest, DocumentPage, DocumentUpdate};
use docx_core::document::CoreProperties;
use docx_core::store::DocumentQuery;
use docx_store::models::{AuditRecord, DocumentRecord, DocumentStatus};
use docx_store::schema::DOCX_MIME_TYPE;
use serde::Deserialize;
use serde_json::{Value, json};
use surrealdb::Connection;

use super::{attachment, decode_optional, file_stem, non_blank};
use crate::{ApiError, ApiJson, AppState};

pub(super) fn routes<C>() -> Router<AppState<C>>
where
    C: Connection + Send + Sync + 'static,
{
    Router::new()
        .route(
            "/documents",
            get(list_documents::<C>).post(create_document::<C>),
        )
        .route("/documents/upload", post(upload_document::<C>))
        .route(
            "/documents/:document_id",
            get(get_document::<C>)
                .patch(update_document::<C>)
                .delete(delete_document::<C>),
        )
        .route("/documents/:document_id/info", get(document_info::<C>))
        .route(
            "/documents/:document_id/properties",
            get(get_properties::<C>).put(set_properties::<C>),
        )
        .route(
            "/documents/:document_id/content",
            get(download_content::<C>).put(replace_content::<C>),
        )
        .route("/documents/:document_id/close", post(close_document::<C>))
        .route("/open-documents", get(open_documents::<C>))
        .route("/search", get(search_documents::<C>))
        .route("/audit", get(list_audit::<C>))
}

#[derive(Debug, Deserialize)]
struct ListDocumentsQuery {
    search: Option<String>,
    status: Option<DocumentStatus>,
    owner: Option<String>,
    #[serde(default)]
    skip: usize,
    limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct CreateDocumentBody {
    #[serde(flatten)]
    request: CreateDocumentRequest,
    #[serde(default)]
    content_base64: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UploadQuery {
    title: String,
    description: Option<String>,
    owner: Option<String>,
    #[serde(default)]
    tracking_enabled: bool,
}

#[derive(Debug, Deserialize)]
struct ReplaceContentQuery {
    author: Option<String>,
    summary: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchQuery {
    q: String,
    limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct AuditQuery {
    resource_id: Option<String>,
    limit: Option<usize>,
}

async fn list_documents<C: Connection>(
    State(state): State<AppState<C>>,
    Query(query): Query<ListDocumentsQuery>,
) -> Result<Json<DocumentPage>, ApiError> {
    let filter = DocumentQuery {
        search: non_blank(query.search),
        status: query.status,
        owner: non_blank(query.owner),
    };
    let page = state
        .run(state.control().list_documents(filter, query.skip, query.limit))
        .await?;
    Ok(Json(page))
}

async fn create_document<C: Connection>(
    State(state): State<AppState<C>>,
    ApiJson(body): ApiJson<CreateDocumentBody>,
) -> Result<(StatusCode, Json<DocumentRecord>), ApiError> {
    let mut request = body.request;
    request.content = decode_optional("content_base64", body.content_base64.as_deref())?;
    let record = state.run(state.control().create_document(request)).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

/// Creates a document from a raw `.docx` request body.
async fn upload_document<C: Connection>(
    State(state): State<AppState<C>>,
    Query(query): Query<UploadQuery>,
    body: Bytes,
) -> Result<(StatusCode, Json<DocumentRecord>), ApiError> {
    if body.is_empty() {
        return Err(ApiError::bad_request("request body must contain a .docx package"));
    }
    let request = CreateDocumentRequest {
        title: query.title,
        description: query.description,
        owner: query.owner,
        tracking_enabled: query.tracking_enabled,
        content: Some(body.to_vec()),
        ..CreateDocumentRequest::default()
    };
    let record = state.run(state.control().create_document(request)).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

async fn get_document<C: Connection>(
    State(state): State<AppState<C>>,
    Path(document_id): Path<String>,
) -> Result<Json<DocumentRecord>, ApiError> {
    let record = state.run(state.control().get_document(&document_id)).await?;
    Ok(Json(record))
}

async fn update_document<C: Connection>(
    State(state): State<AppState<C>>,
    Path(document_id): Path<String>,
    ApiJson(update): ApiJson<DocumentUpdate>,
) -> Result<Json<DocumentRecord>, ApiError> {
    let record = state
        .run(state.control().update_document(&document_id, update))
        .await?;
    Ok(Json(record))
}

async fn delete_document<C: Connection>(
    State(state): State<AppState<C>>,
    Path(document_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.run(state.control().delete_document(&document_id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn document_info<C: Connection>(
    State(state): State<AppState<C>>,
    Path(document_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let record = state.run(state.control().get_document(&document_id)).await?;
    let content = state
        .read(&document_id, |doc| {
            Ok(json!({
                "structure": doc.structure(),
                "characters": doc.character_count(),
                "properties": doc.metadata(),
            }))
        })
        .await?;
    Ok(Json(json!({ "document": record, "content": content })))
}

async fn get_properties<C: Connection>(
    State(state): State<AppState<C>>,
    Path(document_id): Path<String>,
) -> Result<Json<CoreProperties>, ApiError> {
    let properties = state
        .read(&document_id, |doc| Ok(doc.metadata().clone()))
        .await?;
    Ok(Json(properties))
}

async fn set_properties<C: Connection>(
    State(state): State<AppState<C>>,
    Path(document_id): Path<String>,
    ApiJson(patch): ApiJson<CoreProperties>,
) -> Result<Json<CoreProperties>, ApiError> {
    let properties = state
        .edit(&document_id, |doc| Ok(doc.set_metadata(&patch).clone()))
        .await?;
    Ok(Json(properties))
}

async fn download_content<C: Connection>(
    State(state): State<AppState<C>>,
    Path(document_id): Path<String>,
) -> Result<Response, ApiError> {
    let record = state.run(state.control().get_document(&document_id)).await?;
    let bytes = state.run(state.control().document_content(&document_id)).await?;
    let file_name = format!("{}.docx", file_stem(&record.title));
    Ok(attachment(bytes, DOCX_MIME_TYPE, &file_name))
}

async fn replace_content<C: Connection>(
    State(state): State<AppState<C>>,
    Path(document_id): Path<String>,
    Query(query): Query<ReplaceContentQuery>,
    body: Bytes,
) -> Result<Json<DocumentRecord>, ApiError> {
    if body.is_empty() {
        return Err(ApiError::bad_request("request body must contain a .docx package"));
    }
    let record = state
        .run(state.control().replace_content(
            &document_id,
            body.to_vec(),
            query.author,
            query.summary,
        ))
        .await?;
    Ok(Json(record))
}

async fn close_document<C: Connection>(
    State(state): State<AppState<C>>,
    Path(document_id): Path<String>,
) -> Json<Value> {
    let closed = state.control().close_document(&document_id).await;
    Json(json!({ "document_id": document_id, "closed": closed }))
}

async fn open_documents<C: Connection>(State(state): State<AppState<C>>) -> Json<Vec<String>> {
    Json(state.control().cache().document_ids().await)
}

async fn search_documents<C: Connection>(
    State(state): State<AppState<C>>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<DocumentRecord>>, ApiError> {
    let records = state
        .run(state.control().search_documents(&query.q, query.limit))
        .await?;
    Ok(Json(records))
}

async fn list_audit<C: Connection>(
    State(state): State<AppState<C>>,
    Query(query): Query<AuditQuery>,
) -> Result<Json<Vec<AuditRecord>>, ApiError> {
    let resource_id = non_blank(query.resource_id);
    let records = state
        .run(state.control().list_audit(resource_id.as_deref(), query.limit))
        .await?;
    Ok(Json(records))
}
