//! Background job infrastructure.
//!
//! - [`PostgresJobQueue`] - jobs table with idempotent enqueue and
//!   `FOR UPDATE SKIP LOCKED` claiming
//! - [`WorkerPool`] - N [`JobWorker`] loops that stop on a cancellation token
//! - [`JobCommand`] - the commands the pipeline schedules
//!
//! What a command does lives in the domains; see
//! `domains::catalog::jobs::CatalogJobHandler`.

mod command;
mod job;
mod queue;
mod worker;

pub use command::JobCommand;
pub use job::{retry_delay, Job, JobStatus};
pub use queue::{ClaimedJob, CommandMeta, EnqueueResult, PostgresJobQueue};
pub use worker::{JobFailure, JobHandler, JobWorker, JobWorkerConfig, WorkerPool};
