use axum::Router;
use axum::extract::{Json, Path, State};
use axum::routing::post;
use docx_core::control::{BatchRequest, BatchResult, BatchValidation};
use surrealdb::Connection;

use crate::{ApiError, ApiJson, AppState};

pub(super) fn routes<C>() -> Router<AppState<C>>
where
    C: Connection + Send + Sync + 'static,
{
    Router::new()
        .route("/documents/:document_id/batch", post(execute_batch::<C>))
        .route(
            "/documents/:document_id/batch/validate",
            post(validate_batch::<C>),
        )
}

async fn execute_batch<C: Connection>(
    State(state): State<AppState<C>>,
    Path(document_id): Path<String>,
    ApiJson(body): ApiJson<BatchRequest>,
) -> Result<Json<BatchResult>, ApiError> {
    let outcome = state
        .run(state.control().execute_batch(&document_id, body))
        .await?;
    Ok(Json(outcome))
}

async fn validate_batch<C: Connection>(
    State(state): State<AppState<C>>,
    Path(document_id): Path<String>,
    ApiJson(body): ApiJson<BatchRequest>,
) -> Result<Json<BatchValidation>, ApiError> {
    let validation = state
        .run(state.control().validate_batch(&document_id, &body))
        .await?;
    Ok(Json(validation))
}
