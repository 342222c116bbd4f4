use docx_core::control::{CreateDocumentRequest, CreateTemplateRequest, DocumentUpdate};
use docx_core::document::CoreProperties;
use docx_core::store::DocumentQuery;
use docx_store::models::DocumentStatus;
use rmcp::{
    ErrorData,
    handler::server::wrapper::Parameters,
    model::CallToolResult,
    schemars,
    tool,
    tool_router,
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use surrealdb::Connection;

use crate::{DocxMcp, helpers};

/// Parameters for creating a document.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct CreateDocumentParams {
    pub title: String,
    pub description: Option<String>,
    /// Start from this template instead of a blank document.
    pub template_id: Option<String>,
    /// Base64 `.docx` package to import instead of a blank document.
    pub content_base64: Option<String>,
    pub owner: Option<String>,
    /// Free-form JSON object stored with the document.
    pub metadata: Option<Value>,
    pub tracking_enabled: Option<bool>,
}

/// Parameters for addressing one document.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct DocumentIdParams {
    pub document_id: String,
}

/// Parameters for paging through documents.
#[derive(Debug, Clone, Default, Serialize, Deserialize, schemars::JsonSchema)]
pub struct ListDocumentsParams {
    /// Case-insensitive match against title and body text.
    pub search: Option<String>,
    /// draft, pending_review, approved, published or archived.
    pub status: Option<String>,
    pub owner: Option<String>,
    pub skip: Option<usize>,
    pub limit: Option<usize>,
}

/// Parameters for full-text document search.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct SearchDocumentsParams {
    pub query: String,
    pub limit: Option<usize>,
}

/// Parameters for updating document metadata.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct UpdateDocumentParams {
    pub document_id: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<String>,
    /// Keys merged into the stored metadata; null removes a key.
    pub metadata: Option<Value>,
}

/// Parameters for replacing a document's content with an uploaded package.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct ReplaceContentParams {
    pub document_id: String,
    pub content_base64: String,
    pub author: Option<String>,
    pub change_summary: Option<String>,
}

/// Parameters for setting core document properties.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct SetPropertiesParams {
    pub document_id: String,
    pub title: Option<String>,
    pub subject: Option<String>,
    pub author: Option<String>,
    pub keywords: Option<String>,
    pub comments: Option<String>,
    pub category: Option<String>,
    pub language: Option<String>,
    pub last_modified_by: Option<String>,
}

/// Parameters for creating a template from a document or a package.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct CreateTemplateParams {
    pub name: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub is_public: Option<bool>,
    pub document_id: Option<String>,
    pub content_base64: Option<String>,
}

/// Parameters for addressing one template.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct TemplateIdParams {
    pub template_id: String,
}

/// Parameters for listing templates.
#[derive(Debug, Clone, Default, Serialize, Deserialize, schemars::JsonSchema)]
pub struct ListTemplatesParams {
    pub category: Option<String>,
}

/// Parameters for reading the audit trail.
#[derive(Debug, Clone, Default, Serialize, Deserialize, schemars::JsonSchema)]
pub struct ListAuditParams {
    pub resource_id: Option<String>,
    pub limit: Option<usize>,
}

fn decode_optional(field: &str, value: Option<&str>) -> Result<Option<Vec<u8>>, ErrorData> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(|value| helpers::decode_base64(field, value))
        .transpose()
}

#[tool_router(router = tool_router_documents, vis = "pub")]
impl<C: Connection> DocxMcp<C> {
    #[tool(description = "Create a document: blank, from template_id, or from base64 content. Returns the document record.")]
    async fn create_document(
        &self,
        Parameters(params): Parameters<CreateDocumentParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let content = decode_optional("content_base64", params.content_base64.as_deref())?;
        let record = self
            .control
            .create_document(CreateDocumentRequest {
                title: params.title,
                description: params.description,
                template_id: helpers::non_blank(params.template_id),
                content,
                owner: params.owner,
                metadata: params.metadata,
                tracking_enabled: params.tracking_enabled.unwrap_or(false),
            })
            .await
            .map_err(helpers::map_err)?;
        helpers::json_result(record)
    }

    #[tool(description = "Fetch a document record by id.")]
    async fn get_document(
        &self,
        Parameters(params): Parameters<DocumentIdParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let record = self
            .control
            .get_document(&params.document_id)
            .await
            .map_err(helpers::map_err)?;
        helpers::json_result(record)
    }

    #[tool(description = "List documents, most recently updated first, with optional search, status and owner filters.")]
    async fn list_documents(
        &self,
        Parameters(params): Parameters<ListDocumentsParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let query = DocumentQuery {
            search: helpers::non_blank(params.search),
            status: helpers::parse_opt::<DocumentStatus>(params.status.as_deref())?,
            owner: helpers::non_blank(params.owner),
        };
        let page = self
            .control
            .list_documents(query, params.skip.unwrap_or(0), params.limit)
            .await
            .map_err(helpers::map_err)?;
        helpers::json_result(page)
    }

    #[tool(description = "Search documents whose title or text contains the query (case-insensitive).")]
    async fn search_documents(
        &self,
        Parameters(params): Parameters<SearchDocumentsParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let documents = self
            .control
            .search_documents(&params.query, params.limit)
            .await
            .map_err(helpers::map_err)?;
        helpers::json_result(documents)
    }

    #[tool(description = "Update a document's title, description, status or metadata.")]
    async fn update_document(
        &self,
        Parameters(params): Parameters<UpdateDocumentParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let update = DocumentUpdate {
            title: params.title,
            description: params.description,
            status: helpers::parse_opt::<DocumentStatus>(params.status.as_deref())?,
            metadata: params.metadata,
        };
        let record = self
            .control
            .update_document(&params.document_id, update)
            .await
            .map_err(helpers::map_err)?;
        helpers::json_result(record)
    }

    #[tool(description = "Delete a document with its versions, comments, revisions and export jobs.")]
    async fn delete_document(
        &self,
        Parameters(params): Parameters<DocumentIdParams>,
    ) -> Result<CallToolResult, ErrorData> {
        self.control
            .delete_document(&params.document_id)
            .await
            .map_err(helpers::map_err)?;
        helpers::json_result(json!({ "deleted": params.document_id }))
    }

    #[tool(description = "Summarize a document: record, structure counts, character counts and core properties.")]
    async fn get_document_info(
        &self,
        Parameters(params): Parameters<DocumentIdParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let record = self
            .control
            .get_document(&params.document_id)
            .await
            .map_err(helpers::map_err)?;
        let info = self
            .read(&params.document_id, |doc| {
                Ok(json!({
                    "structure": doc.structure(),
                    "characters": doc.character_count(),
                    "properties": doc.core,
                }))
            })
            .await?;
        helpers::json_result(json!({ "document": record, "content": info }))
    }

    #[tool(description = "Set core document properties (title, subject, author, keywords, ...). Absent fields are unchanged.")]
    async fn set_document_properties(
        &self,
        Parameters(params): Parameters<SetPropertiesParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let patch = CoreProperties {
            title: params.title,
            subject: params.subject,
            author: params.author,
            keywords: params.keywords,
            comments: params.comments,
            category: params.category,
            language: params.language,
            last_modified_by: params.last_modified_by,
            ..CoreProperties::default()
        };
        let properties = self
            .edit(&params.document_id, |doc| Ok(doc.set_metadata(&patch).clone()))
            .await?;
        helpers::json_result(properties)
    }

    #[tool(description = "Download the current .docx package as base64.")]
    async fn get_document_content(
        &self,
        Parameters(params): Parameters<DocumentIdParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let bytes = self
            .control
            .document_content(&params.document_id)
            .await
            .map_err(helpers::map_err)?;
        helpers::json_result(json!({
            "document_id": params.document_id,
            "size": bytes.len(),
            "content_base64": helpers::encode_base64(&bytes),
        }))
    }

    #[tool(description = "Replace a document's content with a base64 .docx package. The new content becomes a new version.")]
    async fn replace_document_content(
        &self,
        Parameters(params): Parameters<ReplaceContentParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let bytes = helpers::decode_base64("content_base64", &params.content_base64)?;
        let record = self
            .control
            .replace_content(&params.document_id, bytes, params.author, params.change_summary)
            .await
            .map_err(helpers::map_err)?;
        helpers::json_result(record)
    }

    #[tool(description = "Release a document from the in-memory cache. Saved content is unaffected.")]
    async fn close_document(
        &self,
        Parameters(params): Parameters<DocumentIdParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let closed = self.control.close_document(&params.document_id).await;
        helpers::json_result(json!({ "document_id": params.document_id, "closed": closed }))
    }

    #[tool(description = "List ids of documents currently held in the in-memory cache.")]
    async fn list_open_documents(&self) -> Result<CallToolResult, ErrorData> {
        helpers::json_result(self.control.cache().document_ids().await)
    }

    #[tool(description = "Create a template from an existing document_id or from base64 content.")]
    async fn create_template(
        &self,
        Parameters(params): Parameters<CreateTemplateParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let content = decode_optional("content_base64", params.content_base64.as_deref())?;
        let template = self
            .control
            .create_template(CreateTemplateRequest {
                name: params.name,
                description: params.description,
                category: params.category,
                is_public: params.is_public.unwrap_or(true),
                document_id: helpers::non_blank(params.document_id),
                content,
            })
            .await
            .map_err(helpers::map_err)?;
        helpers::json_result(template)
    }

    #[tool(description = "List templates, optionally filtered by category.")]
    async fn list_templates(
        &self,
        Parameters(params): Parameters<ListTemplatesParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let category = helpers::non_blank(params.category);
        let templates = self
            .control
            .list_templates(category.as_deref())
            .await
            .map_err(helpers::map_err)?;
        helpers::json_result(templates)
    }

    #[tool(description = "List the distinct template categories.")]
    async fn list_template_categories(&self) -> Result<CallToolResult, ErrorData> {
        let categories = self
            .control
            .template_categories()
            .await
            .map_err(helpers::map_err)?;
        helpers::json_result(categories)
    }

    #[tool(description = "Fetch a template by id.")]
    async fn get_template(
        &self,
        Parameters(params): Parameters<TemplateIdParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let template = self
            .control
            .get_template(&params.template_id)
            .await
            .map_err(helpers::map_err)?;
        helpers::json_result(template)
    }

    #[tool(description = "Delete a template.")]
    async fn delete_template(
        &self,
        Parameters(params): Parameters<TemplateIdParams>,
    ) -> Result<CallToolResult, ErrorData> {
        self.control
            .delete_template(&params.template_id)
            .await
            .map_err(helpers::map_err)?;
        helpers::json_result(json!({ "deleted": params.template_id }))
    }

    #[tool(description = "Read the audit trail, newest first, optionally for one resource id.")]
    async fn list_audit(
        &self,
        Parameters(params): Parameters<ListAuditParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let resource_id = helpers::non_blank(params.resource_id);
        let entries = self
            .control
            .list_audit(resource_id.as_deref(), params.limit)
            .await
            .map_err(helpers::map_err)?;
        helpers::json_result(entries)
    }
}

#[cfg(test)]
mod tests {
    use rmcp::model::ErrorCode;

    use super::*;
    use crate::test_support::{build_server, json_of};

    #[tokio::test]
    async fn documents_are_created_edited_and_summarized() {
        let (server, _dir) = build_server("document_tools").await;
        let created = server
            .create_document(Parameters(CreateDocumentParams {
                title: "Minutes".to_string(),
                description: None,
                template_id: None,
                content_base64: None,
                owner: Some("ops".to_string()),
                metadata: None,
                tracking_enabled: None,
            }))
            .await
            .expect("create_document should succeed");
        let document_id = json_of(&created)["document_id"]
            .as_str()
            .expect("record should carry a document_id")
            .to_string();

        server
            .edit(&document_id, |doc| doc.add_paragraph("Attendees: everyone", None, None))
            .await
            .expect("add_paragraph should succeed");

        let info = server
            .get_document_info(Parameters(DocumentIdParams {
                document_id: document_id.clone(),
            }))
            .await
            .expect("get_document_info should succeed");
        let info = json_of(&info);
        assert_eq!(info["document"]["title"], "Minutes");
        assert_eq!(info["content"]["structure"]["paragraphs"], 1);
        assert_eq!(info["content"]["structure"]["words"], 2);

        let content = server
            .get_document_content(Parameters(DocumentIdParams {
                document_id: document_id.clone(),
            }))
            .await
            .expect("get_document_content should succeed");
        let encoded = json_of(&content)["content_base64"]
            .as_str()
            .expect("content should be base64")
            .to_string();
        let bytes = helpers::decode_base64("content_base64", &encoded).expect("valid base64");
        assert!(bytes.starts_with(b"PK"));
    }

    #[tokio::test]
    async fn invalid_inputs_are_rejected_as_params() {
        let (server, _dir) = build_server("document_errors").await;
        let err = server
            .create_document(Parameters(CreateDocumentParams {
                title: "Broken".to_string(),
                description: None,
                template_id: None,
                content_base64: Some("not base64!".to_string()),
                owner: None,
                metadata: None,
                tracking_enabled: None,
            }))
            .await
            .expect_err("bad base64 should fail");
        assert_eq!(err.code, ErrorCode::INVALID_PARAMS);

        let err = server
            .list_documents(Parameters(ListDocumentsParams {
                status: Some("finished".to_string()),
                ..ListDocumentsParams::default()
            }))
            .await
            .expect_err("unknown status should fail");
        assert_eq!(err.code, ErrorCode::INVALID_PARAMS);

        let err = server
            .get_document(Parameters(DocumentIdParams {
                document_id: "missing".to_string(),
            }))
            .await
            .expect_err("unknown document should fail");
        assert_eq!(err.code, ErrorCode::RESOURCE_NOT_FOUND);
    }
}
