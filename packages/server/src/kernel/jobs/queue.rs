//! PostgreSQL-backed job queue.

use anyhow::{Context, Result};
use chrono::Utc;
use serde::{de::DeserializeOwned, Serialize};
use sqlx::PgPool;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::job::{retry_delay, Job};
use crate::common::JobId;

/// Outcome of an enqueue that may hit an idempotency key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnqueueResult {
    /// A new job was inserted
    Created(JobId),
    /// A live job with the same key already exists
    Duplicate(JobId),
}

impl EnqueueResult {
    pub fn job_id(&self) -> JobId {
        match self {
            EnqueueResult::Created(id) | EnqueueResult::Duplicate(id) => *id,
        }
    }

    pub fn is_created(&self) -> bool {
        matches!(self, EnqueueResult::Created(_))
    }
}

/// How a command is stored as a job.
pub trait CommandMeta {
    /// Stored as `job_type`.
    fn command_type(&self) -> &'static str;

    /// At most one pending or running job exists per key.
    fn idempotency_key(&self) -> Option<String> {
        None
    }

    fn max_attempts(&self) -> i32 {
        3
    }
}

/// A job a worker has claimed.
#[derive(Debug, Clone)]
pub struct ClaimedJob {
    pub id: JobId,
    pub job: Job,
}

impl ClaimedJob {
    pub fn deserialize<C: DeserializeOwned>(&self) -> Result<C> {
        serde_json::from_value(self.job.args.clone())
            .with_context(|| format!("invalid payload for job {} ({})", self.id, self.job.job_type))
    }

    pub fn command_type(&self) -> &str {
        &self.job.job_type
    }

    pub fn attempt(&self) -> i32 {
        self.job.attempts
    }
}

#[derive(Clone)]
pub struct PostgresJobQueue {
    pool: PgPool,
    lease: Duration,
}

impl PostgresJobQueue {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            lease: Duration::from_secs(15 * 60),
        }
    }

    /// How long a claim holds before another worker may take the job over.
    pub fn with_lease(mut self, lease: Duration) -> Self {
        self.lease = lease;
        self
    }

    pub fn lease(&self) -> Duration {
        self.lease
    }

    /// Insert a job. With an idempotency key, a live job holding the same
    /// key is returned as `Duplicate` instead.
    pub async fn enqueue<C>(&self, command: &C) -> Result<EnqueueResult>
    where
        C: Serialize + CommandMeta,
    {
        let key = command.idempotency_key();
        if let Some(key) = &key {
            if let Some(existing) = Job::find_live_by_idempotency_key(key, &self.pool).await? {
                debug!(job_id = %existing.id, key = %key, "idempotent enqueue hit live job");
                return Ok(EnqueueResult::Duplicate(existing.id));
            }
        }

        let args = serde_json::to_value(command).context("Failed to serialize job command")?;

        // The partial unique index settles races between concurrent enqueues
        let inserted = sqlx::query_scalar::<_, JobId>(
            r#"
            INSERT INTO jobs (id, job_type, args, max_attempts, idempotency_key)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (idempotency_key)
                WHERE idempotency_key IS NOT NULL AND status IN ('pending', 'running')
                DO NOTHING
            RETURNING id
            "#,
        )
        .bind(JobId::new())
        .bind(command.command_type())
        .bind(args)
        .bind(command.max_attempts().max(1))
        .bind(&key)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(id) = inserted {
            info!(job_id = %id, job_type = command.command_type(), "job enqueued");
            return Ok(EnqueueResult::Created(id));
        }

        let key = key.unwrap_or_default();
        let existing = Job::find_live_by_idempotency_key(&key, &self.pool)
            .await?
            .with_context(|| format!("idempotency conflict on {} but no live job found", key))?;
        Ok(EnqueueResult::Duplicate(existing.id))
    }

    /// Claim up to `limit` due jobs, plus running jobs whose lease expired
    /// with attempts to spare. Expired jobs without any are failed first.
    pub async fn claim(&self, worker_id: &str, limit: i64) -> Result<Vec<ClaimedJob>> {
        self.fail_exhausted_leases().await?;

        let jobs = sqlx::query_as::<_, Job>(
            r#"
            WITH next_jobs AS (
                SELECT id
                FROM jobs
                WHERE (status = 'pending' AND run_at <= NOW())
                   OR (status = 'running'
                       AND lease_expires_at < NOW()
                       AND attempts < max_attempts)
                ORDER BY run_at, id
                LIMIT $1
                FOR UPDATE SKIP LOCKED
            )
            UPDATE jobs
            SET
                status = 'running',
                attempts = attempts + 1,
                worker_id = $2,
                lease_expires_at = NOW() + make_interval(secs => $3),
                updated_at = NOW()
            WHERE id IN (SELECT id FROM next_jobs)
            RETURNING *
            "#,
        )
        .bind(limit)
        .bind(worker_id)
        .bind(self.lease.as_secs_f64())
        .fetch_all(&self.pool)
        .await?;

        Ok(jobs
            .into_iter()
            .map(|job| ClaimedJob { id: job.id, job })
            .collect())
    }

    async fn fail_exhausted_leases(&self) -> Result<()> {
        let expired = sqlx::query_scalar::<_, JobId>(
            r#"
            UPDATE jobs
            SET status = 'failed',
                last_error = 'lease expired on final attempt',
                lease_expires_at = NULL,
                updated_at = NOW()
            WHERE status = 'running'
              AND lease_expires_at < NOW()
              AND attempts >= max_attempts
            RETURNING id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        for job_id in expired {
            warn!(job_id = %job_id, "job lease expired on final attempt");
        }
        Ok(())
    }

    /// Push the lease forward for a job `worker_id` still holds.
    pub async fn heartbeat(&self, job_id: JobId, worker_id: &str) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE jobs
            SET lease_expires_at = NOW() + make_interval(secs => $3),
                updated_at = NOW()
            WHERE id = $1 AND status = 'running' AND worker_id = $2
            "#,
        )
        .bind(job_id)
        .bind(worker_id)
        .bind(self.lease.as_secs_f64())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Mark a job succeeded. Returns false when `worker_id` no longer holds
    /// it, in which case nothing changes.
    pub async fn complete(&self, job_id: JobId, worker_id: &str) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE jobs
            SET status = 'succeeded',
                last_error = NULL,
                lease_expires_at = NULL,
                updated_at = NOW()
            WHERE id = $1 AND status = 'running' AND worker_id = $2
            "#,
        )
        .bind(job_id)
        .bind(worker_id)
        .execute(&self.pool)
        .await?;

        let owned = result.rows_affected() > 0;
        if !owned {
            warn!(job_id = %job_id, worker_id = %worker_id, "completion from worker that lost the job");
        }
        Ok(owned)
    }

    /// Record a failure. Retryable failures go back to pending with
    /// exponential backoff until `max_attempts` is used up. Returns false
    /// when `worker_id` no longer holds the job.
    pub async fn fail(
        &self,
        job_id: JobId,
        worker_id: &str,
        error: &str,
        retryable: bool,
    ) -> Result<bool> {
        let job = Job::find_by_id(job_id, &self.pool)
            .await?
            .with_context(|| format!("job {} disappeared", job_id))?;

        if retryable && job.can_retry() {
            let retry_at = Utc::now() + retry_delay(job.attempts);
            let result = sqlx::query(
                r#"
                UPDATE jobs
                SET status = 'pending',
                    run_at = $3,
                    last_error = $4,
                    worker_id = NULL,
                    lease_expires_at = NULL,
                    updated_at = NOW()
                WHERE id = $1 AND status = 'running' AND worker_id = $2
                "#,
            )
            .bind(job_id)
            .bind(worker_id)
            .bind(retry_at)
            .bind(error)
            .execute(&self.pool)
            .await?;

            if result.rows_affected() == 0 {
                warn!(job_id = %job_id, worker_id = %worker_id, "failure from worker that lost the job");
                return Ok(false);
            }
            info!(
                job_id = %job_id,
                attempt = job.attempts,
                retry_at = %retry_at,
                "job scheduled for retry"
            );
        } else {
            let result = sqlx::query(
                r#"
                UPDATE jobs
                SET status = 'failed',
                    last_error = $3,
                    lease_expires_at = NULL,
                    updated_at = NOW()
                WHERE id = $1 AND status = 'running' AND worker_id = $2
                "#,
            )
            .bind(job_id)
            .bind(worker_id)
            .bind(error)
            .execute(&self.pool)
            .await?;

            if result.rows_affected() == 0 {
                warn!(job_id = %job_id, worker_id = %worker_id, "failure from worker that lost the job");
                return Ok(false);
            }
            warn!(job_id = %job_id, attempts = job.attempts, error = %error, "job failed permanently");
        }

        Ok(true)
    }

    pub async fn find(&self, job_id: JobId) -> Result<Option<Job>> {
        Job::find_by_id(job_id, &self.pool).await
    }
}
