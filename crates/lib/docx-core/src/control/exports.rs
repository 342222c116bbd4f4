use std::sync::Arc;

use docx_store::models::{AuditAction, ExportFormat, ExportJobRecord, JobStatus};
use docx_store::schema::{RESOURCE_EXPORT, export_blob_name};
use serde::{Deserialize, Serialize};
use serde_json::json;
use surrealdb::Connection;
use tracing::{info, warn};

use crate::render;
use crate::services::{ExportHandler, ExportQueue, ExportQueueConfig, ExportTask, JobError};

use super::{ControlError, DocxControlPlane, new_id, timestamp};

/// A rendered export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportOutput {
    pub format: ExportFormat,
    pub bytes: Vec<u8>,
}

impl ExportOutput {
    #[must_use]
    pub const fn mime_type(&self) -> &'static str {
        self.format.mime_type()
    }

    /// The output as text, for every format except `docx`.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        if self.format == ExportFormat::Docx {
            return None;
        }
        std::str::from_utf8(&self.bytes).ok()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportFormatInfo {
    pub format: ExportFormat,
    pub extension: String,
    pub mime_type: String,
    pub description: String,
}

/// Formats accepted by `export_now` and `start_export`.
#[must_use]
pub fn export_formats() -> Vec<ExportFormatInfo> {
    ExportFormat::ALL
        .iter()
        .map(|format| ExportFormatInfo {
            format: *format,
            extension: format!(".{}", format.extension()),
            mime_type: format.mime_type().to_string(),
            description: match format {
                ExportFormat::Html => "HTML Document",
                ExportFormat::Markdown => "Markdown",
                ExportFormat::Text => "Plain Text",
                ExportFormat::Docx => "Word Document",
            }
            .to_string(),
        })
        .collect()
}

impl<C: Connection> DocxControlPlane<C> {
    /// Starts background export workers. Must be called from within a Tokio
    /// runtime.
    #[must_use]
    pub fn with_export_queue(mut self, config: ExportQueueConfig) -> Self
    where
        C: Send + Sync + 'static,
    {
        let worker = self.clone();
        let handler: ExportHandler = Arc::new(move |task: ExportTask| {
            let plane = worker.clone();
            Box::pin(async move {
                plane.run_export(task).await;
            })
        });
        self.exports = Some(ExportQueue::start(config, handler));
        self
    }

    async fn render_export(
        &self,
        document_id: &str,
        format: ExportFormat,
        include_styles: bool,
    ) -> Result<Vec<u8>, ControlError> {
        if format == ExportFormat::Docx {
            return self.document_content(document_id).await;
        }
        self.read(document_id, |doc| render::render(doc, format, include_styles))
            .await
    }

    /// Renders a document synchronously.
    ///
    /// # Errors
    /// Returns `ControlError::Render` for an unsupported format such as
    /// `pdf` and `ControlError::NotFound` for an unknown document.
    pub async fn export_now(
        &self,
        document_id: &str,
        format: &str,
        include_styles: bool,
    ) -> Result<ExportOutput, ControlError> {
        let format = render::parse_format(format)?;
        let bytes = self.render_export(document_id, format, include_styles).await?;
        self.audit(
            AuditAction::Export,
            RESOURCE_EXPORT,
            document_id,
            Some(json!({ "format": format, "size": bytes.len() })),
        )
        .await;
        Ok(ExportOutput { format, bytes })
    }

    /// Queues a background export and returns the pending job.
    ///
    /// # Errors
    /// Returns `ControlError::Job` when no workers run or the queue is full.
    pub async fn start_export(
        &self,
        document_id: &str,
        format: &str,
        include_styles: bool,
    ) -> Result<ExportJobRecord, ControlError> {
        let Some(queue) = &self.exports else {
            return Err(JobError::Closed.into());
        };
        let format = render::parse_format(format)?;
        self.require_document(document_id).await?;
        let job = self
            .store
            .create_export_job(ExportJobRecord {
                id: None,
                job_id: new_id(),
                document_id: document_id.to_string(),
                format,
                include_styles,
                status: JobStatus::Pending,
                file_name: None,
                error: None,
                created_at: timestamp(),
                completed_at: None,
            })
            .await?;
        let task = ExportTask {
            job_id: job.job_id.clone(),
            document_id: document_id.to_string(),
            format,
            include_styles,
        };
        if let Err(err) = queue.enqueue(task) {
            let mut failed = job;
            failed.status = JobStatus::Failed;
            failed.error = Some(err.to_string());
            failed.completed_at = Some(timestamp());
            self.store.update_export_job(failed).await?;
            return Err(err.into());
        }
        info!(job_id = %job.job_id, document_id, %format, "export job queued");
        Ok(job)
    }

    /// Worker body: moves a job through running to completed or failed.
    async fn run_export(&self, task: ExportTask) {
        let job_id = task.job_id.clone();
        if let Err(err) = self.process_export(task).await {
            warn!(job_id = %job_id, error = %err, "export job could not be updated");
        }
    }

    async fn process_export(&self, task: ExportTask) -> Result<(), ControlError> {
        let Some(mut job) = self.store.get_export_job(&task.job_id).await? else {
            return Err(ControlError::not_found("Export job", &task.job_id));
        };
        job.status = JobStatus::Running;
        let mut job = self.store.update_export_job(job).await?;
        info!(job_id = %job.job_id, "export job running");

        let rendered = self
            .render_export(&task.document_id, task.format, task.include_styles)
            .await;
        let stored = match rendered {
            Ok(bytes) => {
                let file_name = export_blob_name(&job.job_id, task.format.extension());
                self.blobs
                    .put(&file_name, &bytes)
                    .await
                    .map(|size| (file_name, size))
                    .map_err(ControlError::from)
            }
            Err(err) => Err(err),
        };
        job.completed_at = Some(timestamp());
        match stored {
            Ok((file_name, size)) => {
                job.status = JobStatus::Completed;
                job.file_name = Some(file_name);
                info!(job_id = %job.job_id, size, "export job completed");
                self.audit(
                    AuditAction::Export,
                    RESOURCE_EXPORT,
                    &task.document_id,
                    Some(json!({ "format": task.format, "job_id": job.job_id, "size": size })),
                )
                .await;
            }
            Err(err) => {
                job.status = JobStatus::Failed;
                job.error = Some(err.to_string());
                warn!(job_id = %job.job_id, error = %err, "export job failed");
            }
        }
        self.store.update_export_job(job).await?;
        Ok(())
    }

    /// # Errors
    /// Returns `ControlError::NotFound` for an unknown job.
    pub async fn get_export_job(&self, job_id: &str) -> Result<ExportJobRecord, ControlError> {
        self.store
            .get_export_job(job_id)
            .await?
            .ok_or_else(|| ControlError::not_found("Export job", job_id))
    }

    /// # Errors
    /// Returns `ControlError::NotFound` for an unknown document.
    pub async fn list_export_jobs(&self, document_id: &str) -> Result<Vec<ExportJobRecord>, ControlError> {
        self.require_document(document_id).await?;
        Ok(self.store.list_export_jobs(document_id).await?)
    }

    /// Output of a completed export job.
    ///
    /// # Errors
    /// Returns `ControlError::Conflict` while the job has not completed.
    pub async fn export_file(&self, job_id: &str) -> Result<(ExportJobRecord, ExportOutput), ControlError> {
        let job = self.get_export_job(job_id).await?;
        let file_name = match (&job.status, &job.file_name) {
            (JobStatus::Completed, Some(file_name)) => file_name.clone(),
            (JobStatus::Failed, _) => {
                return Err(ControlError::Conflict(format!(
                    "Export job {job_id} failed: {}",
                    job.error.as_deref().unwrap_or("unknown error")
                )));
            }
            (status, _) => {
                return Err(ControlError::Conflict(format!(
                    "Export job {job_id} is {status}"
                )));
            }
        };
        let bytes = self.blobs.get(&file_name).await?;
        let output = ExportOutput {
            format: job.format,
            bytes,
        };
        Ok((job, output))
    }
}
