use axum::Router;
use axum::extract::{Json, Path, State};
use axum::http::StatusCode;
use axum::response::Response;
use axum::routing::get;
use docx_core::editor::{ImageFormat, ImageInfo, ImageInsert};
use serde::Deserialize;
use surrealdb::Connection;

use super::{attachment, decode_base64};
use crate::{ApiError, ApiJson, AppState};

pub(super) fn routes<C>() -> Router<AppState<C>>
where
    C: Connection + Send + Sync + 'static,
{
    Router::new()
        .route(
            "/documents/:document_id/images",
            get(list_images::<C>).post(insert_image::<C>),
        )
        .route(
            "/documents/:document_id/images/:image",
            get(get_image::<C>)
                .patch(resize_image::<C>)
                .delete(delete_image::<C>),
        )
        .route(
            "/documents/:document_id/images/:image/data",
            get(image_data::<C>),
        )
}

#[derive(Debug, Deserialize)]
struct InsertImageBody {
    image_base64: String,
    #[serde(flatten)]
    options: ImageInsert,
}

/// New size in inches. A missing dimension keeps the aspect ratio.
#[derive(Debug, Deserialize)]
struct ResizeBody {
    width: Option<f64>,
    height: Option<f64>,
}

async fn list_images<C: Connection>(
    State(state): State<AppState<C>>,
    Path(document_id): Path<String>,
) -> Result<Json<Vec<ImageInfo>>, ApiError> {
    let images = state.read(&document_id, |doc| Ok(doc.images())).await?;
    Ok(Json(images))
}

async fn insert_image<C: Connection>(
    State(state): State<AppState<C>>,
    Path(document_id): Path<String>,
    ApiJson(body): ApiJson<InsertImageBody>,
) -> Result<(StatusCode, Json<ImageInfo>), ApiError> {
    let data = decode_base64("image_base64", &body.image_base64)?;
    let image = state
        .edit(&document_id, |doc| {
            let index = doc.insert_image(&data, &body.options)?;
            doc.image(index)
        })
        .await?;
    Ok((StatusCode::CREATED, Json(image)))
}

async fn get_image<C: Connection>(
    State(state): State<AppState<C>>,
    Path((document_id, image)): Path<(String, usize)>,
) -> Result<Json<ImageInfo>, ApiError> {
    let info = state.read(&document_id, |doc| doc.image(image)).await?;
    Ok(Json(info))
}

async fn image_data<C: Connection>(
    State(state): State<AppState<C>>,
    Path((document_id, image)): Path<(String, usize)>,
) -> Result<Response, ApiError> {
    let (bytes, content_type) = state
        .read(&document_id, |doc| doc.image_data(image))
        .await?;
    let format = ImageFormat::sniff(&bytes);
    let content_type = content_type
        .or_else(|| format.map(|format| format.content_type().to_string()))
        .unwrap_or_else(|| "application/octet-stream".to_string());
    let extension = format.map_or("bin", ImageFormat::extension);
    Ok(attachment(bytes, &content_type, &format!("image{image}.{extension}")))
}

async fn resize_image<C: Connection>(
    State(state): State<AppState<C>>,
    Path((document_id, image)): Path<(String, usize)>,
    ApiJson(body): ApiJson<ResizeBody>,
) -> Result<Json<ImageInfo>, ApiError> {
    let info = state
        .edit(&document_id, |doc| doc.resize_image(image, body.width, body.height))
        .await?;
    Ok(Json(info))
}

async fn delete_image<C: Connection>(
    State(state): State<AppState<C>>,
    Path((document_id, image)): Path<(String, usize)>,
) -> Result<StatusCode, ApiError> {
    state.edit(&document_id, |doc| doc.delete_image(image)).await?;
    Ok(StatusCode::NO_CONTENT)
}
