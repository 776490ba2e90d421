//! Postgres job queue: idempotent enqueue, claiming, retries and workers.
//!
//! Requires Docker: `cargo test -- --ignored`

mod common;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use materials_core::common::ProductId;
use materials_core::kernel::jobs::{
    ClaimedJob, JobCommand, JobFailure, JobHandler, JobStatus, JobWorkerConfig, PostgresJobQueue,
    WorkerPool,
};
use tokio_util::sync::CancellationToken;

use crate::common::TestHarness;

async fn make_due_now(queue_pool: &sqlx::PgPool) {
    sqlx::query("UPDATE jobs SET run_at = NOW() WHERE status = 'pending'")
        .execute(queue_pool)
        .await
        .unwrap();
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn duplicate_enqueue_returns_live_job() {
    let harness = TestHarness::new().await.unwrap();
    let queue = PostgresJobQueue::new(harness.db_pool.clone());
    let product_id = ProductId::new();

    let first = queue
        .enqueue(&JobCommand::EmbedProduct { product_id })
        .await
        .unwrap();
    let second = queue
        .enqueue(&JobCommand::EmbedProduct { product_id })
        .await
        .unwrap();

    assert!(first.is_created());
    assert!(!second.is_created());
    assert_eq!(first.job_id(), second.job_id());

    // Once the job is finished the key is free again
    let claimed = queue.claim("worker-a", 10).await.unwrap();
    assert!(queue.complete(claimed[0].id, "worker-a").await.unwrap());
    let third = queue
        .enqueue(&JobCommand::EmbedProduct { product_id })
        .await
        .unwrap();
    assert!(third.is_created());
    assert_ne!(third.job_id(), first.job_id());
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn claim_hands_each_job_to_one_worker() {
    let harness = TestHarness::new().await.unwrap();
    let queue = PostgresJobQueue::new(harness.db_pool.clone());
    for _ in 0..3 {
        queue
            .enqueue(&JobCommand::ExtractProduct {
                product_id: ProductId::new(),
                force: false,
            })
            .await
            .unwrap();
    }

    let a = queue.claim("worker-a", 2).await.unwrap();
    let b = queue.claim("worker-b", 2).await.unwrap();
    let c = queue.claim("worker-c", 2).await.unwrap();

    assert_eq!(a.len(), 2);
    assert_eq!(b.len(), 1);
    assert!(c.is_empty());
    assert_eq!(b[0].attempt(), 1);
    assert_eq!(b[0].job.worker_id.as_deref(), Some("worker-b"));
    assert_eq!(b[0].command_type(), "extract_product");

    let command: JobCommand = b[0].deserialize().unwrap();
    assert!(matches!(command, JobCommand::ExtractProduct { force: false, .. }));
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn expired_lease_is_reclaimed() {
    let harness = TestHarness::new().await.unwrap();
    let queue = PostgresJobQueue::new(harness.db_pool.clone()).with_lease(Duration::ZERO);
    queue
        .enqueue(&JobCommand::ScrapeManufacturer {
            slug: "leier".to_string(),
            max_products: None,
        })
        .await
        .unwrap();

    let first = queue.claim("crashed-worker", 1).await.unwrap();
    tokio::time::sleep(Duration::from_millis(20)).await;
    let second = queue.claim("healthy-worker", 1).await.unwrap();

    assert_eq!(first[0].id, second[0].id);
    assert_eq!(second[0].attempt(), 2);
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn expired_lease_on_final_attempt_fails_the_job() {
    let harness = TestHarness::new().await.unwrap();
    let queue = PostgresJobQueue::new(harness.db_pool.clone()).with_lease(Duration::ZERO);
    let job_id = queue
        .enqueue(&JobCommand::ExtractProduct {
            product_id: ProductId::new(),
            force: false,
        })
        .await
        .unwrap()
        .job_id();

    // ExtractProduct allows three attempts; every worker crashes
    for attempt in 1..=3 {
        let claimed = queue.claim(&format!("worker-{}", attempt), 1).await.unwrap();
        assert_eq!(claimed.len(), 1, "attempt {}", attempt);
        assert_eq!(claimed[0].attempt(), attempt);
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    assert!(queue.claim("worker-4", 1).await.unwrap().is_empty());
    let job = queue.find(job_id).await.unwrap().unwrap();
    assert_eq!(job.status().unwrap(), JobStatus::Failed);
    assert_eq!(job.attempts, 3);
    assert_eq!(
        job.last_error.as_deref(),
        Some("lease expired on final attempt")
    );
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn stale_worker_cannot_settle_a_reclaimed_job() {
    let harness = TestHarness::new().await.unwrap();
    let queue = PostgresJobQueue::new(harness.db_pool.clone()).with_lease(Duration::ZERO);
    let job_id = queue
        .enqueue(&JobCommand::EmbedProduct {
            product_id: ProductId::new(),
        })
        .await
        .unwrap()
        .job_id();

    queue.claim("slow-worker", 1).await.unwrap();
    tokio::time::sleep(Duration::from_millis(20)).await;
    let reclaimed = queue.claim("new-owner", 1).await.unwrap();
    assert_eq!(reclaimed[0].id, job_id);

    assert!(!queue.complete(job_id, "slow-worker").await.unwrap());
    assert!(!queue
        .fail(job_id, "slow-worker", "timed out", false)
        .await
        .unwrap());
    let job = queue.find(job_id).await.unwrap().unwrap();
    assert_eq!(job.status().unwrap(), JobStatus::Running);
    assert_eq!(job.worker_id.as_deref(), Some("new-owner"));
    assert!(job.last_error.is_none());

    assert!(queue.complete(job_id, "new-owner").await.unwrap());
    let job = queue.find(job_id).await.unwrap().unwrap();
    assert_eq!(job.status().unwrap(), JobStatus::Succeeded);
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn retryable_failures_back_off_then_fail() {
    let harness = TestHarness::new().await.unwrap();
    let queue = PostgresJobQueue::new(harness.db_pool.clone());
    let job_id = queue
        .enqueue(&JobCommand::ExtractProduct {
            product_id: ProductId::new(),
            force: true,
        })
        .await
        .unwrap()
        .job_id();

    // ExtractProduct allows three attempts
    for attempt in 1..=3 {
        let claimed = queue.claim("worker-a", 1).await.unwrap();
        assert_eq!(claimed.len(), 1, "attempt {}", attempt);
        assert!(queue.fail(job_id, "worker-a", "HTTP 503", true).await.unwrap());

        let job = queue.find(job_id).await.unwrap().unwrap();
        if attempt < 3 {
            assert_eq!(job.status().unwrap(), JobStatus::Pending);
            assert!(job.run_at > chrono::Utc::now());
            // Backed off, so nothing is due yet
            assert!(queue.claim("worker-a", 1).await.unwrap().is_empty());
            make_due_now(&harness.db_pool).await;
        } else {
            assert_eq!(job.status().unwrap(), JobStatus::Failed);
            assert_eq!(job.last_error.as_deref(), Some("HTTP 503"));
        }
    }
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn permanent_failure_skips_retries() {
    let harness = TestHarness::new().await.unwrap();
    let queue = PostgresJobQueue::new(harness.db_pool.clone());
    let job_id = queue
        .enqueue(&JobCommand::ScrapeManufacturer {
            slug: "knauf".to_string(),
            max_products: None,
        })
        .await
        .unwrap()
        .job_id();

    queue.claim("worker-a", 1).await.unwrap();
    queue
        .fail(job_id, "worker-a", "unknown manufacturer: knauf", false)
        .await
        .unwrap();

    let job = queue.find(job_id).await.unwrap().unwrap();
    assert_eq!(job.status().unwrap(), JobStatus::Failed);
    assert_eq!(job.attempts, 1);
}

/// Records every command and fails the ones for `poisoned`.
struct RecordingHandler {
    seen: Mutex<Vec<JobCommand>>,
    poisoned: ProductId,
}

#[async_trait]
impl JobHandler for RecordingHandler {
    async fn handle(&self, job: &ClaimedJob) -> Result<(), JobFailure> {
        let command: JobCommand = job.deserialize().map_err(JobFailure::Permanent)?;
        let poisoned = matches!(
            &command,
            JobCommand::EmbedProduct { product_id } if *product_id == self.poisoned
        );
        self.seen.lock().unwrap().push(command);
        if poisoned {
            return Err(JobFailure::Permanent(anyhow::anyhow!("poisoned product")));
        }
        Ok(())
    }
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn worker_pool_drains_queue_and_stops() {
    let harness = TestHarness::new().await.unwrap();
    let queue = PostgresJobQueue::new(harness.db_pool.clone());
    let good = ProductId::new();
    let poisoned = ProductId::new();
    let good_job = queue
        .enqueue(&JobCommand::EmbedProduct { product_id: good })
        .await
        .unwrap()
        .job_id();
    let poisoned_job = queue
        .enqueue(&JobCommand::EmbedProduct { product_id: poisoned })
        .await
        .unwrap()
        .job_id();

    let handler = Arc::new(RecordingHandler {
        seen: Mutex::new(Vec::new()),
        poisoned,
    });
    let shutdown = CancellationToken::new();
    let pool = WorkerPool::spawn(
        2,
        queue.clone(),
        handler.clone(),
        JobWorkerConfig::default().with_poll_interval(Duration::from_millis(50)),
        shutdown.clone(),
    );
    assert_eq!(pool.len(), 2);

    let mut finished = false;
    for _ in 0..100 {
        let good = queue.find(good_job).await.unwrap().unwrap();
        let bad = queue.find(poisoned_job).await.unwrap().unwrap();
        if good.status().unwrap().is_terminal() && bad.status().unwrap().is_terminal() {
            finished = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    shutdown.cancel();
    pool.join().await;

    assert!(finished, "jobs did not finish in time");
    let good = queue.find(good_job).await.unwrap().unwrap();
    let bad = queue.find(poisoned_job).await.unwrap().unwrap();
    assert_eq!(good.status().unwrap(), JobStatus::Succeeded);
    assert_eq!(bad.status().unwrap(), JobStatus::Failed);
    assert_eq!(bad.last_error.as_deref(), Some("poisoned product"));
    assert_eq!(handler.seen.lock().unwrap().len(), 2);
}
