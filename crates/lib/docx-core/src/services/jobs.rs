use std::error::Error;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use docx_store::models::ExportFormat;
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, mpsc};
use tracing::{debug, warn};

/// One queued export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportTask {
    pub job_id: String,
    pub document_id: String,
    pub format: ExportFormat,
    pub include_styles: bool,
}

pub type ExportHandlerFuture = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;
pub type ExportHandler = Arc<dyn Fn(ExportTask) -> ExportHandlerFuture + Send + Sync + 'static>;

#[derive(Debug, Clone, Copy)]
pub struct ExportQueueConfig {
    pub workers: usize,
    pub capacity: usize,
}

impl Default for ExportQueueConfig {
    fn default() -> Self {
        Self {
            workers: 2,
            capacity: 64,
        }
    }
}

impl ExportQueueConfig {
    #[must_use]
    pub const fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    #[must_use]
    pub const fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobError {
    QueueFull { capacity: usize },
    Closed,
}

impl fmt::Display for JobError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::QueueFull { capacity } => {
                write!(f, "export queue is full ({capacity} jobs pending)")
            }
            Self::Closed => f.write_str("export queue is not running"),
        }
    }
}

impl Error for JobError {}

/// Bounded queue drained by a fixed pool of worker tasks.
#[derive(Clone)]
pub struct ExportQueue {
    sender: mpsc::Sender<ExportTask>,
    capacity: usize,
}

impl ExportQueue {
    /// Spawns the workers and returns the queue handle. Workers stop once
    /// every handle is dropped and the backlog is drained.
    ///
    /// Must be called from within a Tokio runtime.
    #[must_use]
    pub fn start(config: ExportQueueConfig, handler: ExportHandler) -> Self {
        let capacity = config.capacity.max(1);
        let (sender, receiver) = mpsc::channel::<ExportTask>(capacity);
        let receiver = Arc::new(Mutex::new(receiver));
        for worker in 0..config.workers.max(1) {
            let receiver = receiver.clone();
            let handler = handler.clone();
            tokio::spawn(async move {
                loop {
                    let next = receiver.lock().await.recv().await;
                    let Some(task) = next else {
                        break;
                    };
                    debug!(worker, job_id = %task.job_id, "export worker picked up job");
                    handler(task).await;
                }
                debug!(worker, "export worker stopped");
            });
        }
        Self { sender, capacity }
    }

    /// Queues a task without waiting.
    ///
    /// # Errors
    /// Returns `JobError::QueueFull` when the backlog is at capacity and
    /// `JobError::Closed` when the workers are gone.
    pub fn enqueue(&self, task: ExportTask) -> Result<(), JobError> {
        self.sender.try_send(task).map_err(|err| match err {
            mpsc::error::TrySendError::Full(task) => {
                warn!(job_id = %task.job_id, capacity = self.capacity, "export queue full");
                JobError::QueueFull {
                    capacity: self.capacity,
                }
            }
            mpsc::error::TrySendError::Closed(_) => JobError::Closed,
        })
    }

    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn task(id: &str) -> ExportTask {
        ExportTask {
            job_id: id.to_string(),
            document_id: "doc".to_string(),
            format: ExportFormat::Text,
            include_styles: false,
        }
    }

    #[tokio::test]
    async fn workers_process_queued_tasks() {
        let (done_tx, mut done_rx) = mpsc::unbounded_channel();
        let handler: ExportHandler = Arc::new(move |task: ExportTask| {
            let done_tx = done_tx.clone();
            Box::pin(async move {
                let _ = done_tx.send(task.job_id);
            })
        });
        let queue = ExportQueue::start(ExportQueueConfig::default().with_workers(3), handler);
        for id in ["a", "b", "c"] {
            queue.enqueue(task(id)).unwrap();
        }
        let mut seen = Vec::new();
        for _ in 0..3 {
            let id = tokio::time::timeout(Duration::from_secs(5), done_rx.recv())
                .await
                .unwrap()
                .unwrap();
            seen.push(id);
        }
        seen.sort();
        assert_eq!(seen, ["a", "b", "c"]);
    }

    #[tokio::test]
    async fn full_queue_is_reported() {
        let gate = Arc::new(tokio::sync::Notify::new());
        let blocker = gate.clone();
        let handler: ExportHandler = Arc::new(move |_task: ExportTask| {
            let blocker = blocker.clone();
            Box::pin(async move {
                blocker.notified().await;
            })
        });
        let queue = ExportQueue::start(
            ExportQueueConfig::default().with_workers(1).with_capacity(1),
            handler,
        );
        queue.enqueue(task("running")).unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;
        queue.enqueue(task("waiting")).unwrap();
        assert_eq!(
            queue.enqueue(task("rejected")),
            Err(JobError::QueueFull { capacity: 1 })
        );
        gate.notify_waiters();
    }
}
