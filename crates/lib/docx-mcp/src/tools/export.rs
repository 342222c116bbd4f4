use docx_core::control::{ExportOutput, export_formats};
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

use super::documents::DocumentIdParams;
use crate::{DocxMcp, helpers};

/// Parameters for exporting a document.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct ExportParams {
    pub document_id: String,
    /// html, markdown, text or docx.
    pub format: String,
    /// Embed a stylesheet in html output. Defaults to true.
    pub include_styles: Option<bool>,
}

/// Parameters for addressing one export job.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct ExportJobParams {
    pub job_id: String,
}

/// Text formats are returned inline; docx output is base64.
fn output_payload(output: &ExportOutput) -> Value {
    let mut payload = json!({
        "format": output.format,
        "mime_type": output.mime_type(),
        "size": output.bytes.len(),
    });
    if let Some(text) = output.as_text() {
        payload["content"] = Value::String(text.to_string());
    } else {
        payload["content_base64"] = Value::String(helpers::encode_base64(&output.bytes));
    }
    payload
}

#[tool_router(router = tool_router_export, vis = "pub")]
impl<C: Connection> DocxMcp<C> {
    #[tool(description = "List the supported export formats.")]
    async fn list_export_formats(&self) -> Result<CallToolResult, ErrorData> {
        helpers::json_result(export_formats())
    }

    #[tool(description = "Render a document now. Text formats come back inline, docx as base64.")]
    async fn export_document(
        &self,
        Parameters(params): Parameters<ExportParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let output = self
            .control
            .export_now(
                &params.document_id,
                &params.format,
                params.include_styles.unwrap_or(true),
            )
            .await
            .map_err(helpers::map_err)?;
        helpers::json_result(output_payload(&output))
    }

    #[tool(description = "Queue a background export. Poll get_export_job, then fetch with get_export_file.")]
    async fn start_export(
        &self,
        Parameters(params): Parameters<ExportParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let job = self
            .control
            .start_export(
                &params.document_id,
                &params.format,
                params.include_styles.unwrap_or(true),
            )
            .await
            .map_err(helpers::map_err)?;
        helpers::json_result(job)
    }

    #[tool(description = "Fetch an export job's status.")]
    async fn get_export_job(
        &self,
        Parameters(params): Parameters<ExportJobParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let job = self
            .control
            .get_export_job(&params.job_id)
            .await
            .map_err(helpers::map_err)?;
        helpers::json_result(job)
    }

    #[tool(description = "List export jobs for a document, newest first.")]
    async fn list_export_jobs(
        &self,
        Parameters(params): Parameters<DocumentIdParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let jobs = self
            .control
            .list_export_jobs(&params.document_id)
            .await
            .map_err(helpers::map_err)?;
        helpers::json_result(jobs)
    }

    #[tool(description = "Download the output of a completed export job.")]
    async fn get_export_file(
        &self,
        Parameters(params): Parameters<ExportJobParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let (job, output) = self
            .control
            .export_file(&params.job_id)
            .await
            .map_err(helpers::map_err)?;
        let mut payload = output_payload(&output);
        payload["job_id"] = Value::String(job.job_id);
        helpers::json_result(payload)
    }
}

#[cfg(test)]
mod tests {
    use docx_store::models::ExportFormat;

    use super::*;

    #[test]
    fn text_exports_are_inline_and_docx_is_encoded() {
        let text = output_payload(&ExportOutput {
            format: ExportFormat::Markdown,
            bytes: b"# Title\n".to_vec(),
        });
        assert_eq!(text["content"], "# Title\n");
        assert!(text.get("content_base64").is_none());

        let docx = output_payload(&ExportOutput {
            format: ExportFormat::Docx,
            bytes: vec![0x50, 0x4b, 0x03, 0x04],
        });
        assert_eq!(docx["content_base64"], "UEsDBA==");
        assert!(docx.get("content").is_none());
    }
}
