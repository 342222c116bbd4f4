pub const TABLE_DOCUMENT: &str = "document";
pub const TABLE_DOCUMENT_VERSION: &str = "document_version";
pub const TABLE_COMMENT: &str = "comment";
pub const TABLE_REVISION: &str = "revision";
pub const TABLE_TEMPLATE: &str = "template";
pub const TABLE_EXPORT_JOB: &str = "export_job";
pub const TABLE_AUDIT_LOG: &str = "audit_log";

pub const RESOURCE_DOCUMENT: &str = "document";
pub const RESOURCE_TEMPLATE: &str = "template";
pub const RESOURCE_COMMENT: &str = "comment";
pub const RESOURCE_REVISION: &str = "revision";
pub const RESOURCE_EXPORT: &str = "export";

pub const DOCX_MIME_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

pub const DEFAULT_PAGE_SIZE: usize = 20;
pub const MAX_PAGE_SIZE: usize = 100;

/// Record key for a version snapshot.
#[must_use]
pub fn make_version_key(document_id: &str, version_number: u32) -> String {
    format!("{document_id}_v{version_number}")
}

/// Blob key for the working copy of a document.
#[must_use]
pub fn document_blob_name(document_id: &str) -> String {
    format!("{document_id}.docx")
}

/// Blob key for a version snapshot.
#[must_use]
pub fn version_blob_name(document_id: &str, version_number: u32) -> String {
    format!("{document_id}.v{version_number}.docx")
}

/// Blob key for a template package.
#[must_use]
pub fn template_blob_name(template_id: &str) -> String {
    format!("template-{template_id}.docx")
}

/// Blob key for an export artifact.
#[must_use]
pub fn export_blob_name(job_id: &str, extension: &str) -> String {
    format!("export-{job_id}.{extension}")
}

/// Clamps a caller-supplied page size to the supported range.
#[must_use]
pub fn clamp_page_size(limit: Option<usize>) -> usize {
    limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_size_is_clamped() {
        assert_eq!(clamp_page_size(None), DEFAULT_PAGE_SIZE);
        assert_eq!(clamp_page_size(Some(0)), 1);
        assert_eq!(clamp_page_size(Some(500)), MAX_PAGE_SIZE);
    }

    #[test]
    fn blob_names_are_flat() {
        assert_eq!(version_blob_name("abc", 3), "abc.v3.docx");
        assert_eq!(make_version_key("abc", 3), "abc_v3");
        assert!(!export_blob_name("j", "md").contains('/'));
    }
}
