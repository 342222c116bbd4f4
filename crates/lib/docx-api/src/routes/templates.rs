use axum::Router;
use axum::extract::{Json, Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use docx_core::control::CreateTemplateRequest;
use docx_store::models::TemplateRecord;
use serde::Deserialize;
use surrealdb::Connection;

use super::{decode_optional, non_blank};
use crate::{ApiError, ApiJson, AppState};

pub(super) fn routes<C>() -> Router<AppState<C>>
where
    C: Connection + Send + Sync + 'static,
{
    Router::new()
        .route(
            "/templates",
            get(list_templates::<C>).post(create_template::<C>),
        )
        .route("/templates/categories", get(template_categories::<C>))
        .route(
            "/templates/:template_id",
            get(get_template::<C>).delete(delete_template::<C>),
        )
}

#[derive(Debug, Deserialize)]
struct TemplateQuery {
    category: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CreateTemplateBody {
    #[serde(flatten)]
    request: CreateTemplateRequest,
    #[serde(default)]
    content_base64: Option<String>,
}

async fn list_templates<C: Connection>(
    State(state): State<AppState<C>>,
    Query(query): Query<TemplateQuery>,
) -> Result<Json<Vec<TemplateRecord>>, ApiError> {
    let category = non_blank(query.category);
    let templates = state
        .run(state.control().list_templates(category.as_deref()))
        .await?;
    Ok(Json(templates))
}

async fn create_template<C: Connection>(
    State(state): State<AppState<C>>,
    ApiJson(body): ApiJson<CreateTemplateBody>,
) -> Result<(StatusCode, Json<TemplateRecord>), ApiError> {
    let mut request = body.request;
    request.content = decode_optional("content_base64", body.content_base64.as_deref())?;
    let template = state.run(state.control().create_template(request)).await?;
    Ok((StatusCode::CREATED, Json(template)))
}

async fn template_categories<C: Connection>(
    State(state): State<AppState<C>>,
) -> Result<Json<Vec<String>>, ApiError> {
    let categories = state.run(state.control().template_categories()).await?;
    Ok(Json(categories))
}

async fn get_template<C: Connection>(
    State(state): State<AppState<C>>,
    Path(template_id): Path<String>,
) -> Result<Json<TemplateRecord>, ApiError> {
    let template = state.run(state.control().get_template(&template_id)).await?;
    Ok(Json(template))
}

async fn delete_template<C: Connection>(
    State(state): State<AppState<C>>,
    Path(template_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.run(state.control().delete_template(&template_id)).await?;
    Ok(StatusCode::NO_CONTENT)
}
