use docx_store::models::AuditAction;
use docx_store::schema::RESOURCE_DOCUMENT;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use surrealdb::Connection;
use tracing::info;

use crate::document::{Alignment, CoreProperties, WordDocument};
use crate::editor::{DocumentError, DocumentResult, ParagraphUpdate};

use super::{ControlError, DocxControlPlane};

/// One step of a batch as sent by a client: an operation name and its
/// arguments.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchStep {
    pub operation: String,
    #[serde(default)]
    pub params: Value,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchRequest {
    pub operations: Vec<BatchStep>,
    /// Stop at the first failure and discard every step of the batch.
    #[serde(default)]
    pub stop_on_error: bool,
}

/// Operations a batch may run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "operation", content = "params", rename_all = "snake_case")]
pub enum BatchOperation {
    AddParagraph {
        text: String,
        #[serde(default)]
        style: Option<String>,
        #[serde(default)]
        alignment: Option<Alignment>,
    },
    InsertParagraph {
        index: usize,
        text: String,
        #[serde(default)]
        style: Option<String>,
        #[serde(default)]
        alignment: Option<Alignment>,
    },
    UpdateParagraph {
        index: usize,
        #[serde(default)]
        text: Option<String>,
        #[serde(default)]
        style: Option<String>,
        #[serde(default)]
        alignment: Option<Alignment>,
    },
    DeleteParagraph {
        index: usize,
    },
    AddHeading {
        text: String,
        #[serde(default = "default_heading_level")]
        level: u8,
    },
    ReplaceText {
        find: String,
        replace: String,
        #[serde(default)]
        case_sensitive: bool,
        #[serde(default)]
        whole_word: bool,
    },
    RegexReplace {
        pattern: String,
        replacement: String,
        #[serde(default)]
        case_sensitive: bool,
    },
    AddPageBreak {},
    SetMetadata(CoreProperties),
}

const fn default_heading_level() -> u8 {
    1
}

/// Names accepted in `BatchStep::operation`.
pub const BATCH_OPERATIONS: &[&str] = &[
    "add_paragraph",
    "insert_paragraph",
    "update_paragraph",
    "delete_paragraph",
    "add_heading",
    "replace_text",
    "regex_replace",
    "add_page_break",
    "set_metadata",
];

impl BatchStep {
    /// Resolves the step into a typed operation.
    ///
    /// # Errors
    /// Returns `DocumentError::InvalidArgument` for an unknown operation or
    /// malformed parameters.
    pub fn parse(&self) -> DocumentResult<BatchOperation> {
        if !BATCH_OPERATIONS.contains(&self.operation.as_str()) {
            return Err(DocumentError::invalid(format!(
                "Unknown operation: {}",
                self.operation
            )));
        }
        let params = if self.params.is_null() {
            json!({})
        } else {
            self.params.clone()
        };
        serde_json::from_value(json!({ "operation": self.operation, "params": params })).map_err(
            |err| DocumentError::invalid(format!("Invalid parameters for {}: {err}", self.operation)),
        )
    }
}

impl BatchOperation {
    /// Applies the operation and describes its result.
    ///
    /// # Errors
    /// Returns the editor's error for the operation.
    pub fn apply(self, doc: &mut WordDocument) -> DocumentResult<Value> {
        let result = match self {
            Self::AddParagraph {
                text,
                style,
                alignment,
            } => json!({ "index": doc.add_paragraph(&text, style.as_deref(), alignment)? }),
            Self::InsertParagraph {
                index,
                text,
                style,
                alignment,
            } => json!({ "index": doc.insert_paragraph(index, &text, style.as_deref(), alignment)? }),
            Self::UpdateParagraph {
                index,
                text,
                style,
                alignment,
            } => {
                doc.update_paragraph(
                    index,
                    &ParagraphUpdate {
                        text,
                        style,
                        alignment,
                    },
                )?;
                json!({ "index": index })
            }
            Self::DeleteParagraph { index } => json!({ "deleted": doc.delete_paragraph(index)? }),
            Self::AddHeading { text, level } => json!({ "index": doc.add_heading(&text, level)? }),
            Self::ReplaceText {
                find,
                replace,
                case_sensitive,
                whole_word,
            } => json!({ "replaced": doc.replace_text(&find, &replace, case_sensitive, whole_word)? }),
            Self::RegexReplace {
                pattern,
                replacement,
                case_sensitive,
            } => json!({ "replaced": doc.regex_replace(&pattern, &replacement, case_sensitive)? }),
            Self::AddPageBreak {} => json!({ "index": doc.add_page_break() }),
            Self::SetMetadata(patch) => json!({ "metadata": doc.set_metadata(&patch) }),
        };
        Ok(result)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BatchStepResult {
    pub index: usize,
    pub operation: String,
    pub result: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BatchStepError {
    pub index: usize,
    pub operation: String,
    pub error: String,
}

/// Outcome of a batch. `saved` is false when nothing was written, either
/// because every step failed or because a failure rolled the batch back.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct BatchResult {
    pub success: bool,
    pub saved: bool,
    pub results: Vec<BatchStepResult>,
    pub errors: Vec<BatchStepError>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BatchCheck {
    pub index: usize,
    pub operation: String,
    pub valid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct BatchValidation {
    pub valid: bool,
    pub operation_count: usize,
    pub results: Vec<BatchCheck>,
}

/// Runs every step against `doc`. A failed step leaves no trace in the
/// document. With `stop_on_error` the run ends at the first failure.
fn run_steps(doc: &mut WordDocument, steps: &[BatchStep], stop_on_error: bool) -> BatchResult {
    let mut outcome = BatchResult::default();
    for (index, step) in steps.iter().enumerate() {
        let before = doc.clone();
        match step.parse().and_then(|operation| operation.apply(doc)) {
            Ok(result) => outcome.results.push(BatchStepResult {
                index,
                operation: step.operation.clone(),
                result,
            }),
            Err(err) => {
                *doc = before;
                outcome.errors.push(BatchStepError {
                    index,
                    operation: step.operation.clone(),
                    error: err.to_string(),
                });
                if stop_on_error {
                    break;
                }
            }
        }
    }
    outcome.success = outcome.errors.is_empty();
    outcome
}

impl<C: Connection> DocxControlPlane<C> {
    /// Applies a list of edits as one save.
    ///
    /// With `stop_on_error` a failure discards the whole batch and nothing is
    /// saved. Without it the failed steps are skipped and the rest are saved.
    ///
    /// # Errors
    /// Returns `ControlError::NotFound` for an unknown document, or a store
    /// error when the result cannot be saved. Step failures are reported in
    /// the result.
    pub async fn execute_batch(
        &self,
        document_id: &str,
        request: BatchRequest,
    ) -> Result<BatchResult, ControlError> {
        let mut doc = self.lock_document(document_id).await?;
        let snapshot = doc.clone();
        let mut outcome = run_steps(&mut doc, &request.operations, request.stop_on_error);
        if !outcome.success && request.stop_on_error {
            *doc = snapshot;
            info!(document_id, failed_at = ?outcome.errors.first().map(|err| err.index), "batch rolled back");
            return Ok(outcome);
        }
        if outcome.results.is_empty() {
            return Ok(outcome);
        }
        self.persist(document_id, doc, snapshot).await?;
        outcome.saved = true;
        self.audit(
            AuditAction::Update,
            RESOURCE_DOCUMENT,
            document_id,
            Some(json!({
                "batch": request.operations.len(),
                "applied": outcome.results.len(),
                "failed": outcome.errors.len(),
            })),
        )
        .await;
        Ok(outcome)
    }

    /// Dry-runs a batch against a copy of the document and reports which
    /// steps would fail. Nothing is saved.
    ///
    /// # Errors
    /// Returns `ControlError::NotFound` for an unknown document.
    pub async fn validate_batch(
        &self,
        document_id: &str,
        request: &BatchRequest,
    ) -> Result<BatchValidation, ControlError> {
        let mut copy = self
            .read(document_id, |doc| Ok::<_, DocumentError>(doc.clone()))
            .await?;
        let outcome = run_steps(&mut copy, &request.operations, false);
        let results: Vec<BatchCheck> = request
            .operations
            .iter()
            .enumerate()
            .map(|(index, step)| {
                let error = outcome
                    .errors
                    .iter()
                    .find(|err| err.index == index)
                    .map(|err| err.error.clone());
                BatchCheck {
                    index,
                    operation: step.operation.clone(),
                    valid: error.is_none(),
                    error,
                }
            })
            .collect();
        Ok(BatchValidation {
            valid: outcome.success,
            operation_count: results.len(),
            results,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step(operation: &str, params: Value) -> BatchStep {
        BatchStep {
            operation: operation.to_string(),
            params,
        }
    }

    #[test]
    fn steps_parse_by_name() {
        assert!(matches!(
            step("add_paragraph", json!({ "text": "hi", "alignment": "center" })).parse(),
            Ok(BatchOperation::AddParagraph {
                alignment: Some(Alignment::Center),
                ..
            })
        ));
        assert!(matches!(
            step("add_page_break", Value::Null).parse(),
            Ok(BatchOperation::AddPageBreak {})
        ));
        assert!(matches!(
            step("set_metadata", json!({ "title": "Plan" })).parse(),
            Ok(BatchOperation::SetMetadata(_))
        ));
        let unknown = step("explode", json!({})).parse().unwrap_err();
        assert_eq!(unknown.to_string(), "Unknown operation: explode");
        assert!(step("delete_paragraph", json!({})).parse().is_err());
    }

    #[test]
    fn failed_steps_leave_no_trace() {
        let mut doc = WordDocument::new();
        let steps = vec![
            step("add_paragraph", json!({ "text": "one" })),
            step("insert_paragraph", json!({ "index": 9, "text": "nowhere" })),
            step("add_heading", json!({ "text": "Two", "level": 2 })),
        ];
        let outcome = run_steps(&mut doc, &steps, false);
        assert!(!outcome.success);
        assert_eq!(outcome.results.len(), 2);
        assert_eq!(outcome.errors[0].index, 1);
        assert_eq!(doc.paragraph_count(), 2);

        let mut doc = WordDocument::new();
        let outcome = run_steps(&mut doc, &steps, true);
        assert_eq!(outcome.results.len(), 1);
        assert_eq!(outcome.errors.len(), 1);
    }
}
