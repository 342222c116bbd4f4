use docx_core::editor::ImageInsert;
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

/// Parameters for addressing one image.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct ImageIndexParams {
    pub document_id: String,
    pub image_index: usize,
}

/// Parameters for reading an image.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct GetImageParams {
    pub document_id: String,
    pub image_index: usize,
    /// Include the image bytes as base64.
    #[serde(default)]
    pub include_data: bool,
}

/// Parameters for inserting a PNG, JPEG, GIF or BMP image.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct InsertImageParams {
    pub document_id: String,
    pub image_base64: String,
    /// Inches. With only one dimension the aspect ratio is kept.
    pub width: Option<f64>,
    /// Inches.
    pub height: Option<f64>,
    /// Append to this paragraph instead of a new one.
    pub paragraph_index: Option<usize>,
    /// Alternative text.
    pub description: Option<String>,
}

/// Parameters for resizing an image.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct ResizeImageParams {
    pub document_id: String,
    pub image_index: usize,
    pub width: Option<f64>,
    pub height: Option<f64>,
}

#[tool_router(router = tool_router_media, vis = "pub")]
impl<C: Connection> DocxMcp<C> {
    #[tool(description = "List inline images with size (inches), content type and location.")]
    async fn list_images(
        &self,
        Parameters(params): Parameters<DocumentIdParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let images = self.read(&params.document_id, |doc| Ok(doc.images())).await?;
        helpers::json_result(images)
    }

    #[tool(description = "Fetch one image's details, optionally with its bytes as base64.")]
    async fn get_image(
        &self,
        Parameters(params): Parameters<GetImageParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let index = params.image_index;
        let include_data = params.include_data;
        let (info, data) = self
            .read(&params.document_id, |doc| {
                let info = doc.image(index)?;
                let data = if include_data {
                    Some(doc.image_data(index)?.0)
                } else {
                    None
                };
                Ok((info, data))
            })
            .await?;
        let data = data.map(|bytes| helpers::encode_base64(&bytes));
        helpers::json_result(json!({ "image": info, "data_base64": data }))
    }

    #[tool(description = "Insert a base64 image (png, jpeg, gif or bmp). Returns the image index.")]
    async fn insert_image(
        &self,
        Parameters(params): Parameters<InsertImageParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let data = helpers::decode_base64("image_base64", &params.image_base64)?;
        let options = ImageInsert {
            width: params.width,
            height: params.height,
            paragraph_index: params.paragraph_index,
            description: helpers::non_blank(params.description),
        };
        let info = self
            .edit(&params.document_id, |doc| {
                let index = doc.insert_image(&data, &options)?;
                doc.image(index)
            })
            .await?;
        helpers::json_result(info)
    }

    #[tool(description = "Resize an image (inches). With one dimension the aspect ratio is kept.")]
    async fn resize_image(
        &self,
        Parameters(params): Parameters<ResizeImageParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let info = self
            .edit(&params.document_id, |doc| {
                doc.resize_image(params.image_index, params.width, params.height)
            })
            .await?;
        helpers::json_result(info)
    }

    #[tool(description = "Delete an image. Its media part is removed when no longer referenced.")]
    async fn delete_image(
        &self,
        Parameters(params): Parameters<ImageIndexParams>,
    ) -> Result<CallToolResult, ErrorData> {
        self.edit(&params.document_id, |doc| doc.delete_image(params.image_index))
            .await?;
        helpers::json_result(json!({ "deleted_image": params.image_index }))
    }
}
