use axum::Router;
use axum::extract::{Json, Path, Query, State};
use axum::http::StatusCode;
use axum::response::Response;
use axum::routing::get;
use docx_core::control::{ExportFormatInfo, ExportOutput, export_formats};
use docx_store::models::ExportJobRecord;
use serde::Deserialize;
use surrealdb::Connection;

use super::{attachment, file_stem};
use crate::{ApiError, ApiJson, AppState};

pub(super) fn routes<C>() -> Router<AppState<C>>
where
    C: Connection + Send + Sync + 'static,
{
    Router::new()
        .route("/export/formats", get(list_formats))
        .route("/documents/:document_id/export", get(export_document::<C>))
        .route(
            "/documents/:document_id/exports",
            get(list_export_jobs::<C>).post(start_export::<C>),
        )
        .route("/exports/:job_id", get(get_export_job::<C>))
        .route("/exports/:job_id/download", get(download_export::<C>))
}

const fn default_include_styles() -> bool {
    true
}

#[derive(Debug, Deserialize)]
struct ExportQuery {
    format: String,
    #[serde(default = "default_include_styles")]
    include_styles: bool,
}

#[derive(Debug, Deserialize)]
struct StartExportBody {
    format: String,
    #[serde(default = "default_include_styles")]
    include_styles: bool,
}

async fn list_formats() -> Json<Vec<ExportFormatInfo>> {
    Json(export_formats())
}

fn download(output: ExportOutput, stem: &str) -> Response {
    let file_name = format!("{stem}.{}", output.format.extension());
    attachment(output.bytes, output.format.mime_type(), &file_name)
}

async fn export_document<C: Connection>(
    State(state): State<AppState<C>>,
    Path(document_id): Path<String>,
    Query(query): Query<ExportQuery>,
) -> Result<Response, ApiError> {
    let record = state.run(state.control().get_document(&document_id)).await?;
    let output = state
        .run(state
            .control()
            .export_now(&document_id, &query.format, query.include_styles))
        .await?;
    Ok(download(output, &file_stem(&record.title)))
}

async fn start_export<C: Connection>(
    State(state): State<AppState<C>>,
    Path(document_id): Path<String>,
    ApiJson(body): ApiJson<StartExportBody>,
) -> Result<(StatusCode, Json<ExportJobRecord>), ApiError> {
    let job = state
        .run(state
            .control()
            .start_export(&document_id, &body.format, body.include_styles))
        .await?;
    Ok((StatusCode::ACCEPTED, Json(job)))
}

async fn list_export_jobs<C: Connection>(
    State(state): State<AppState<C>>,
    Path(document_id): Path<String>,
) -> Result<Json<Vec<ExportJobRecord>>, ApiError> {
    let jobs = state
        .run(state.control().list_export_jobs(&document_id))
        .await?;
    Ok(Json(jobs))
}

async fn get_export_job<C: Connection>(
    State(state): State<AppState<C>>,
    Path(job_id): Path<String>,
) -> Result<Json<ExportJobRecord>, ApiError> {
    let job = state.run(state.control().get_export_job(&job_id)).await?;
    Ok(Json(job))
}

async fn download_export<C: Connection>(
    State(state): State<AppState<C>>,
    Path(job_id): Path<String>,
) -> Result<Response, ApiError> {
    let (job, output) = state.run(state.control().export_file(&job_id)).await?;
    Ok(download(output, &format!("export_{}", job.job_id)))
}
