//! Workers that drain the job queue.
//!
//! ```text
//! WorkerPool (N workers)
//!     │
//!     └─► JobWorker loop
//!             ├─► claim one job (FOR UPDATE SKIP LOCKED)
//!             ├─► JobHandler::handle, lease heartbeat alongside
//!             └─► complete / fail (retry with backoff)
//! ```

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use futures::future::join_all;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::queue::{ClaimedJob, PostgresJobQueue};

#[derive(Debug, Clone)]
pub struct JobWorkerConfig {
    /// Sleep between polls when the queue is empty
    pub poll_interval: Duration,
    /// Lease renewal period while a job runs
    pub heartbeat_interval: Duration,
    pub worker_id: String,
}

impl Default for JobWorkerConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(2),
            heartbeat_interval: Duration::from_secs(60),
            worker_id: format!("worker-{}", Uuid::new_v4()),
        }
    }
}

impl JobWorkerConfig {
    pub fn with_worker_id(mut self, worker_id: impl Into<String>) -> Self {
        self.worker_id = worker_id.into();
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }
}

/// Failure of a job handler.
#[derive(Debug)]
pub enum JobFailure {
    /// Worth another attempt
    Retryable(anyhow::Error),
    /// Retrying cannot help (bad payload, unknown command)
    Permanent(anyhow::Error),
}

impl JobFailure {
    fn is_retryable(&self) -> bool {
        matches!(self, JobFailure::Retryable(_))
    }

    fn error(&self) -> &anyhow::Error {
        match self {
            JobFailure::Retryable(e) | JobFailure::Permanent(e) => e,
        }
    }
}

impl From<anyhow::Error> for JobFailure {
    fn from(e: anyhow::Error) -> Self {
        JobFailure::Retryable(e)
    }
}

/// Executes claimed jobs.
#[async_trait]
pub trait JobHandler: Send + Sync {
    async fn handle(&self, job: &ClaimedJob) -> Result<(), JobFailure>;
}

/// One polling loop, one job at a time.
pub struct JobWorker {
    queue: PostgresJobQueue,
    handler: Arc<dyn JobHandler>,
    config: JobWorkerConfig,
}

impl JobWorker {
    pub fn new(
        queue: PostgresJobQueue,
        handler: Arc<dyn JobHandler>,
        config: JobWorkerConfig,
    ) -> Self {
        Self {
            queue,
            handler,
            config,
        }
    }

    pub async fn run(self, shutdown: CancellationToken) {
        info!(worker_id = %self.config.worker_id, "job worker starting");

        loop {
            if shutdown.is_cancelled() {
                break;
            }

            let mut jobs = match self.queue.claim(&self.config.worker_id, 1).await {
                Ok(jobs) => jobs,
                Err(e) => {
                    error!(worker_id = %self.config.worker_id, error = %e, "failed to claim jobs");
                    tokio::select! {
                        _ = shutdown.cancelled() => break,
                        _ = tokio::time::sleep(Duration::from_secs(1)) => {}
                    }
                    continue;
                }
            };

            let Some(job) = jobs.pop() else {
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    _ = tokio::time::sleep(self.config.poll_interval) => {}
                }
                continue;
            };

            self.process(job).await;
        }

        info!(worker_id = %self.config.worker_id, "job worker stopped");
    }

    async fn process(&self, job: ClaimedJob) {
        let job_id = job.id;
        let job_type = job.command_type().to_string();
        debug!(job_id = %job_id, job_type = %job_type, attempt = job.attempt(), "job claimed");

        let result = self.execute_with_heartbeat(&job).await;

        match result {
            Ok(()) => {
                debug!(job_id = %job_id, job_type = %job_type, "job succeeded");
                if let Err(e) = self.queue.complete(job_id, &self.config.worker_id).await {
                    error!(job_id = %job_id, error = %e, "failed to mark job as succeeded");
                }
            }
            Err(failure) => {
                let message = format!("{:#}", failure.error());
                warn!(job_id = %job_id, job_type = %job_type, error = %message, "job failed");
                if let Err(e) = self
                    .queue
                    .fail(
                        job_id,
                        &self.config.worker_id,
                        &message,
                        failure.is_retryable(),
                    )
                    .await
                {
                    error!(job_id = %job_id, error = %e, "failed to mark job as failed");
                }
            }
        }
    }

    async fn execute_with_heartbeat(&self, job: &ClaimedJob) -> Result<(), JobFailure> {
        let done = CancellationToken::new();
        let heartbeat = {
            let queue = self.queue.clone();
            let done = done.clone();
            let job_id = job.id;
            let worker_id = self.config.worker_id.clone();
            let period = self.config.heartbeat_interval;
            tokio::spawn(async move {
                let mut interval = tokio::time::interval(period);
                interval.tick().await;
                loop {
                    tokio::select! {
                        _ = done.cancelled() => break,
                        _ = interval.tick() => {
                            if let Err(e) = queue.heartbeat(job_id, &worker_id).await {
                                warn!(job_id = %job_id, error = %e, "heartbeat failed");
                            }
                        }
                    }
                }
            })
        };

        let result = self.handler.handle(job).await;

        done.cancel();
        let _ = heartbeat.await;
        result
    }
}

/// N workers sharing one queue and one handler.
pub struct WorkerPool {
    handles: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    pub fn spawn(
        size: usize,
        queue: PostgresJobQueue,
        handler: Arc<dyn JobHandler>,
        config: JobWorkerConfig,
        shutdown: CancellationToken,
    ) -> Self {
        let size = size.max(1);
        let handles = (0..size)
            .map(|n| {
                let worker_config = config
                    .clone()
                    .with_worker_id(format!("{}-{}", config.worker_id, n));
                let worker = JobWorker::new(queue.clone(), handler.clone(), worker_config);
                tokio::spawn(worker.run(shutdown.clone()))
            })
            .collect();

        info!(workers = size, "worker pool started");
        Self { handles }
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Wait for every worker to exit (after the shutdown token fires).
    pub async fn join(self) {
        for result in join_all(self.handles).await {
            if let Err(e) = result {
                error!(error = %e, "worker task panicked");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = JobWorkerConfig::default();
        assert!(config.worker_id.starts_with("worker-"));
        assert_eq!(config.poll_interval, Duration::from_secs(2));
    }

    #[test]
    fn test_anyhow_errors_are_retryable() {
        let failure: JobFailure = anyhow::anyhow!("timeout").into();
        assert!(failure.is_retryable());
        assert!(!JobFailure::Permanent(anyhow::anyhow!("bad payload")).is_retryable());
    }
}
