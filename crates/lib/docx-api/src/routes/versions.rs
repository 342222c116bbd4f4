use axum::Router;
use axum::extract::{Json, Path, Query, State};
use axum::http::StatusCode;
use axum::response::Response;
use axum::routing::{get, post};
use docx_core::control::VersionComparison;
use docx_store::models::VersionRecord;
use docx_store::schema::DOCX_MIME_TYPE;
use serde::Deserialize;
use surrealdb::Connection;

use super::{attachment, file_stem, non_blank};
use crate::{ApiError, ApiJson, AppState};

pub(super) fn routes<C>() -> Router<AppState<C>>
where
    C: Connection + Send + Sync + 'static,
{
    Router::new()
        .route(
            "/documents/:document_id/versions",
            get(list_versions::<C>).post(create_version::<C>),
        )
        .route(
            "/documents/:document_id/versions/compare",
            get(compare_versions::<C>),
        )
        .route(
            "/documents/:document_id/versions/:version",
            get(get_version::<C>).delete(delete_version::<C>),
        )
        .route(
            "/documents/:document_id/versions/:version/content",
            get(version_content::<C>),
        )
        .route(
            "/documents/:document_id/versions/:version/restore",
            post(restore_version::<C>),
        )
}

#[derive(Debug, Default, Deserialize)]
struct CreateVersionBody {
    change_summary: Option<String>,
    created_by: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RestoreBody {
    created_by: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CompareQuery {
    a: u32,
    b: u32,
}

async fn list_versions<C: Connection>(
    State(state): State<AppState<C>>,
    Path(document_id): Path<String>,
) -> Result<Json<Vec<VersionRecord>>, ApiError> {
    let versions = state
        .run(state.control().list_versions(&document_id))
        .await?;
    Ok(Json(versions))
}

async fn create_version<C: Connection>(
    State(state): State<AppState<C>>,
    Path(document_id): Path<String>,
    body: Option<ApiJson<CreateVersionBody>>,
) -> Result<(StatusCode, Json<VersionRecord>), ApiError> {
    let body = body.map(|ApiJson(body)| body).unwrap_or_default();
    let version = state
        .run(state.control().create_version(
            &document_id,
            non_blank(body.change_summary),
            non_blank(body.created_by),
        ))
        .await?;
    Ok((StatusCode::CREATED, Json(version)))
}

async fn compare_versions<C: Connection>(
    State(state): State<AppState<C>>,
    Path(document_id): Path<String>,
    Query(query): Query<CompareQuery>,
) -> Result<Json<VersionComparison>, ApiError> {
    let comparison = state
        .run(state.control().compare_versions(&document_id, query.a, query.b))
        .await?;
    Ok(Json(comparison))
}

async fn get_version<C: Connection>(
    State(state): State<AppState<C>>,
    Path((document_id, version)): Path<(String, u32)>,
) -> Result<Json<VersionRecord>, ApiError> {
    let record = state
        .run(state.control().get_version(&document_id, version))
        .await?;
    Ok(Json(record))
}

async fn delete_version<C: Connection>(
    State(state): State<AppState<C>>,
    Path((document_id, version)): Path<(String, u32)>,
) -> Result<StatusCode, ApiError> {
    state
        .run(state.control().delete_version(&document_id, version))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn version_content<C: Connection>(
    State(state): State<AppState<C>>,
    Path((document_id, version)): Path<(String, u32)>,
) -> Result<Response, ApiError> {
    let record = state.run(state.control().get_document(&document_id)).await?;
    let bytes = state
        .run(state.control().version_content(&document_id, version))
        .await?;
    let file_name = format!("{}_v{version}.docx", file_stem(&record.title));
    Ok(attachment(bytes, DOCX_MIME_TYPE, &file_name))
}

async fn restore_version<C: Connection>(
    State(state): State<AppState<C>>,
    Path((document_id, version)): Path<(String, u32)>,
    body: Option<ApiJson<RestoreBody>>,
) -> Result<Json<VersionRecord>, ApiError> {
    let body = body.map(|ApiJson(body)| body).unwrap_or_default();
    let restored = state
        .run(state.control().restore_version(
            &document_id,
            version,
            non_blank(body.created_by),
        ))
        .await?;
    Ok(Json(restored))
}
