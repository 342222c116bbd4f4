use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Error returned when a status or kind string does not match a known variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

impl fmt::Display for UnknownVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown {}: {}", self.kind, self.value)
    }
}

impl std::error::Error for UnknownVariant {}

macro_rules! string_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $kind:literal {
            $($(#[$variant_meta:meta])* $variant:ident => $text:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($(#[$variant_meta])* $variant),+
        }

        impl $name {
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = UnknownVariant;

            fn from_str(value: &str) -> Result<Self, Self::Err> {
                let normalized = value.trim().to_ascii_lowercase();
                match normalized.as_str() {
                    $($text => Ok(Self::$variant),)+
                    _ => Err(UnknownVariant {
                        kind: $kind,
                        value: value.to_string(),
                    }),
                }
            }
        }
    };
}

string_enum! {
    /// Workflow status of a stored document.
    #[derive(Default)]
    DocumentStatus, "document status" {
        #[default]
        Draft => "draft",
        PendingReview => "pending_review",
        Approved => "approved",
        Published => "published",
        Archived => "archived",
    }
}

string_enum! {
    /// Lifecycle of a review comment.
    CommentStatus, "comment status" {
        Open => "open",
        Resolved => "resolved",
    }
}

string_enum! {
    /// Kind of change carried by a proposed revision.
    RevisionAction, "revision action" {
        Insert => "insert",
        Delete => "delete",
        Replace => "replace",
        Format => "format",
    }
}

string_enum! {
    /// Decision state of a proposed revision.
    RevisionStatus, "revision status" {
        Pending => "pending",
        Accepted => "accepted",
        Rejected => "rejected",
    }
}

string_enum! {
    /// State of a background export job.
    JobStatus, "job status" {
        Pending => "pending",
        Running => "running",
        Completed => "completed",
        Failed => "failed",
    }
}

string_enum! {
    /// Output formats understood by the exporters.
    ExportFormat, "export format" {
        Html => "html",
        Markdown => "markdown",
        Text => "text",
        Docx => "docx",
    }
}

impl ExportFormat {
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Html => "html",
            Self::Markdown => "md",
            Self::Text => "txt",
            Self::Docx => "docx",
        }
    }

    #[must_use]
    pub const fn mime_type(self) -> &'static str {
        match self {
            Self::Html => "text/html; charset=utf-8",
            Self::Markdown => "text/markdown; charset=utf-8",
            Self::Text => "text/plain; charset=utf-8",
            Self::Docx => crate::schema::DOCX_MIME_TYPE,
        }
    }
}

string_enum! {
    /// Action recorded in the audit log.
    AuditAction, "audit action" {
        Create => "create",
        Update => "update",
        Delete => "delete",
        Export => "export",
        Import => "import",
    }
}

/// Metadata for a stored document. The working copy lives in the blob store
/// under `file_name`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DocumentRecord {
    #[serde(default, skip_deserializing, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub document_id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub status: DocumentStatus,
    pub file_name: String,
    pub file_size: u64,
    pub mime_type: String,
    pub version: u32,
    #[serde(default)]
    pub tracking_enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
    #[serde(default)]
    pub search_text: String,
    pub created_at: String,
    pub updated_at: String,
}

/// Immutable snapshot of a document at a given version number.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VersionRecord {
    #[serde(default, skip_deserializing, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub document_id: String,
    pub version_number: u32,
    pub file_name: String,
    pub file_size: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub change_summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
    pub created_at: String,
}

/// Review comment anchored to a paragraph.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CommentRecord {
    #[serde(default, skip_deserializing, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub comment_id: String,
    pub document_id: String,
    pub docx_comment_id: u32,
    pub author: String,
    pub content: String,
    pub status: CommentStatus,
    pub paragraph_index: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_offset: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_offset: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved_at: Option<String>,
}

/// Proposed change awaiting an accept or reject decision.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RevisionRecord {
    #[serde(default, skip_deserializing, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub revision_id: String,
    pub document_id: String,
    pub author: String,
    pub action: RevisionAction,
    pub paragraph_index: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_content: Option<String>,
    pub status: RevisionStatus,
    pub created_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decided_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decided_by: Option<String>,
}

/// Reusable document template.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TemplateRecord {
    #[serde(default, skip_deserializing, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub template_id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub file_name: String,
    pub is_public: bool,
    pub created_at: String,
}

/// Background export request and its outcome.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExportJobRecord {
    #[serde(default, skip_deserializing, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub job_id: String,
    pub document_id: String,
    pub format: ExportFormat,
    #[serde(default)]
    pub include_styles: bool,
    pub status: JobStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub created_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<String>,
}

/// Audit trail entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuditRecord {
    #[serde(default, skip_deserializing, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub action: AuditAction,
    pub resource_type: String,
    pub resource_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
    pub created_at: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_strings_parse_case_insensitively() {
        assert_eq!(
            "Pending_Review".parse::<DocumentStatus>(),
            Ok(DocumentStatus::PendingReview)
        );
        assert_eq!(" resolved ".parse::<CommentStatus>(), Ok(CommentStatus::Resolved));
        let err = "shipped".parse::<JobStatus>().unwrap_err();
        assert_eq!(err.to_string(), "unknown job status: shipped");
    }

    #[test]
    fn enums_serialize_as_snake_case() {
        let value = serde_json::to_value(DocumentStatus::PendingReview).unwrap();
        assert_eq!(value, Value::String("pending_review".to_string()));
        assert_eq!(ExportFormat::Markdown.extension(), "md");
    }

    #[test]
    fn record_ids_are_not_serialized_when_absent() {
        let record = TemplateRecord {
            id: None,
            template_id: "t1".to_string(),
            name: "Memo".to_string(),
            description: None,
            category: Some("business".to_string()),
            file_name: "templates/t1.docx".to_string(),
            is_public: true,
            created_at: "2024-01-01T00:00:00Z".to_string(),
        };
        let value = serde_json::to_value(&record).unwrap();
        assert!(value.get("id").is_none());
        assert!(value.get("description").is_none());
        assert_eq!(value["category"], "business");
    }
}
