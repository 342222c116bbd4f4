use docx_store::models::{AuditAction, TemplateRecord};
use docx_store::schema::{RESOURCE_TEMPLATE, template_blob_name};
use serde::{Deserialize, Serialize};
use serde_json::json;
use surrealdb::Connection;
use tracing::info;

use crate::parsers::DocxParser;

use super::{ControlError, DocxControlPlane, new_id, non_blank, timestamp};

const fn default_public() -> bool {
    true
}

/// Input for a template. The package comes from an existing document or
/// from uploaded bytes; exactly one must be given.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateTemplateRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default = "default_public")]
    pub is_public: bool,
    #[serde(default)]
    pub document_id: Option<String>,
    #[serde(skip)]
    pub content: Option<Vec<u8>>,
}

impl<C: Connection> DocxControlPlane<C> {
    /// # Errors
    /// Returns `ControlError::InvalidInput` for a missing name or source and
    /// `ControlError::Parse` for an invalid uploaded package.
    pub async fn create_template(
        &self,
        request: CreateTemplateRequest,
    ) -> Result<TemplateRecord, ControlError> {
        let CreateTemplateRequest {
            name,
            description,
            category,
            is_public,
            document_id,
            content,
        } = request;
        let name = non_blank(Some(name)).ok_or_else(|| ControlError::invalid("name is required"))?;
        let bytes = match (document_id, content) {
            (Some(document_id), None) => self.document_content(&document_id).await?,
            (None, Some(bytes)) => {
                self.check_size(bytes.len())?;
                DocxParser::parse_async(bytes.clone()).await?;
                bytes
            }
            _ => {
                return Err(ControlError::invalid(
                    "exactly one of document_id or content is required",
                ));
            }
        };

        let template_id = new_id();
        let file_name = template_blob_name(&template_id);
        self.blobs.put(&file_name, &bytes).await?;
        let template = self
            .store
            .create_template(TemplateRecord {
                id: None,
                template_id,
                name,
                description: non_blank(description),
                category: non_blank(category),
                file_name,
                is_public,
                created_at: timestamp(),
            })
            .await?;
        info!(template_id = %template.template_id, name = %template.name, "template created");
        self.audit(
            AuditAction::Create,
            RESOURCE_TEMPLATE,
            &template.template_id,
            Some(json!({ "name": template.name })),
        )
        .await;
        Ok(template)
    }

    pub(crate) async fn require_template(&self, template_id: &str) -> Result<TemplateRecord, ControlError> {
        self.store
            .get_template(template_id)
            .await?
            .ok_or_else(|| ControlError::not_found("Template", template_id))
    }

    /// # Errors
    /// Returns `ControlError::NotFound` for an unknown template.
    pub async fn get_template(&self, template_id: &str) -> Result<TemplateRecord, ControlError> {
        self.require_template(template_id).await
    }

    /// # Errors
    /// Returns `ControlError` if the store query fails.
    pub async fn list_templates(&self, category: Option<&str>) -> Result<Vec<TemplateRecord>, ControlError> {
        let category = category.map(str::trim).filter(|category| !category.is_empty());
        Ok(self.store.list_templates(category).await?)
    }

    /// Distinct template categories, sorted.
    ///
    /// # Errors
    /// Returns `ControlError` if the store query fails.
    pub async fn template_categories(&self) -> Result<Vec<String>, ControlError> {
        let mut categories: Vec<String> = self
            .store
            .list_templates(None)
            .await?
            .into_iter()
            .filter_map(|template| template.category)
            .collect();
        categories.sort();
        categories.dedup();
        Ok(categories)
    }

    /// # Errors
    /// Returns `ControlError::NotFound` for an unknown template.
    pub async fn delete_template(&self, template_id: &str) -> Result<(), ControlError> {
        let template = self.require_template(template_id).await?;
        self.store.delete_template(template_id).await?;
        self.blobs.delete(&template.file_name).await?;
        self.audit(AuditAction::Delete, RESOURCE_TEMPLATE, template_id, None)
            .await;
        Ok(())
    }
}
