use docx_store::models::AuditRecord;
use docx_store::schema;
use surrealdb::Connection;

use super::{ControlError, DocxControlPlane};

impl<C: Connection> DocxControlPlane<C> {
    /// Reads the audit trail, newest first, optionally for one resource.
    ///
    /// # Errors
    /// Returns `ControlError` if the store query fails.
    pub async fn list_audit(
        &self,
        resource_id: Option<&str>,
        limit: Option<usize>,
    ) -> Result<Vec<AuditRecord>, ControlError> {
        Ok(self
            .store
            .list_audit(resource_id, schema::clamp_page_size(limit))
            .await?)
    }
}
