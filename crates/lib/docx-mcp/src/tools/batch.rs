use docx_core::control::{BatchRequest, BatchStep};
use rmcp::{
    ErrorData,
    handler::server::wrapper::Parameters,
    model::CallToolResult,
    schemars,
    tool,
    tool_router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use surrealdb::Connection;

use crate::{DocxMcp, helpers};

/// Parameters for one step of a batch.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct BatchStepParams {
    /// add_paragraph, insert_paragraph, update_paragraph, delete_paragraph,
    /// add_heading, replace_text, regex_replace, add_page_break or set_metadata.
    pub operation: String,
    /// Arguments named as in the matching single tool, without document_id.
    pub params: Option<Value>,
}

/// Parameters for running or checking a batch of edits.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct BatchParams {
    pub document_id: String,
    pub operations: Vec<BatchStepParams>,
    /// Stop at the first failure and discard the whole batch.
    #[serde(default)]
    pub stop_on_error: bool,
}

impl From<BatchParams> for BatchRequest {
    fn from(params: BatchParams) -> Self {
        Self {
            operations: params
                .operations
                .into_iter()
                .map(|step| BatchStep {
                    operation: step.operation,
                    params: step.params.unwrap_or(Value::Null),
                })
                .collect(),
            stop_on_error: params.stop_on_error,
        }
    }
}

#[tool_router(router = tool_router_batch, vis = "pub")]
impl<C: Connection> DocxMcp<C> {
    #[tool(description = "Run several edits with one save. Returns per-step results and errors. With stop_on_error a failure discards the whole batch.")]
    async fn execute_batch(
        &self,
        Parameters(params): Parameters<BatchParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let document_id = params.document_id.clone();
        let outcome = self
            .control
            .execute_batch(&document_id, params.into())
            .await
            .map_err(helpers::map_err)?;
        helpers::json_result(outcome)
    }

    #[tool(description = "Dry-run a batch against a copy of the document and report which steps would fail.")]
    async fn validate_batch(
        &self,
        Parameters(params): Parameters<BatchParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let document_id = params.document_id.clone();
        let validation = self
            .control
            .validate_batch(&document_id, &params.into())
            .await
            .map_err(helpers::map_err)?;
        helpers::json_result(validation)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::test_support::{build_server, json_of};

    fn step(operation: &str, params: Option<Value>) -> BatchStepParams {
        BatchStepParams {
            operation: operation.to_string(),
            params,
        }
    }

    #[tokio::test]
    async fn batches_apply_in_one_save() {
        let (server, _dir) = build_server("batch_tools").await;
        let record = server
            .control()
            .create_document(docx_core::control::CreateDocumentRequest {
                title: "Checklist".to_string(),
                ..Default::default()
            })
            .await
            .expect("create_document should succeed");
        let document_id = record.document_id;
        let operations = vec![
            step("add_heading", Some(json!({ "text": "Launch", "level": 1 }))),
            step("add_paragraph", Some(json!({ "text": "owner: TBD" }))),
            step("replace_text", Some(json!({ "find": "TBD", "replace": "Dana" }))),
            step("update_paragraph", Some(json!({ "index": 7, "text": "nope" }))),
        ];

        let checked = server
            .validate_batch(Parameters(BatchParams {
                document_id: document_id.clone(),
                operations: operations.clone(),
                stop_on_error: false,
            }))
            .await
            .expect("validate_batch should succeed");
        let checked = json_of(&checked);
        assert_eq!(checked["valid"], false);
        assert_eq!(checked["results"][3]["valid"], false);

        let outcome = server
            .execute_batch(Parameters(BatchParams {
                document_id: document_id.clone(),
                operations,
                stop_on_error: false,
            }))
            .await
            .expect("execute_batch should succeed");
        let outcome = json_of(&outcome);
        assert_eq!(outcome["saved"], true);
        assert_eq!(outcome["results"][2]["result"]["replaced"], 1);

        let texts = server
            .read(&document_id, |doc| {
                Ok(doc.paragraphs().map(|paragraph| paragraph.text()).collect::<Vec<_>>())
            })
            .await
            .expect("read should succeed");
        assert_eq!(texts, ["Launch", "owner: Dana"]);
    }
}
