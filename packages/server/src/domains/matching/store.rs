//! Storage seam for the matching domain.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::warn;
use uuid::Uuid;

use crate::domains::matching::errors::MatchingError;
use crate::domains::matching::models::{MatchingJob, SavedMatchSearch};

#[async_trait]
pub trait MatchingStore: Send + Sync {
    /// Insert `job` unless a non-terminal job already exists for its target;
    /// returns the winning job and whether it was freshly created.
    async fn find_or_create_job(&self, job: MatchingJob) -> Result<(MatchingJob, bool)>;

    async fn find_job(&self, job_id: Uuid) -> Result<Option<MatchingJob>>;

    async fn mark_processing(&self, job_id: Uuid, stage: &str, progress: i32) -> Result<()>;

    /// Progress only ever moves forward; stale writes are clamped.
    async fn update_progress(&self, job_id: Uuid, progress: i32, stage: &str) -> Result<()>;

    /// Atomically overwrite the target's cache entry and mark the job
    /// completed. Skipped (with a warning) when the job is no longer
    /// processing, e.g. after a timeout sweep claimed it.
    async fn complete_job(&self, job_id: Uuid, search: SavedMatchSearch) -> Result<()>;

    async fn fail_job(&self, job_id: Uuid, error: &str) -> Result<()>;

    /// Fail jobs stuck since before `cutoff` (processing by start time,
    /// never-picked-up pending by creation time), setting their error to
    /// `Timeout`. Returns the swept job ids.
    async fn sweep_timed_out(&self, cutoff: DateTime<Utc>) -> Result<Vec<Uuid>>;

    async fn find_search(&self, target_user_id: Uuid) -> Result<Option<SavedMatchSearch>>;
}

/// Postgres-backed store; delegates to the model layer.
pub struct PostgresMatchingStore {
    pool: PgPool,
}

impl PostgresMatchingStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MatchingStore for PostgresMatchingStore {
    async fn find_or_create_job(&self, job: MatchingJob) -> Result<(MatchingJob, bool)> {
        job.insert_unless_active(&self.pool).await
    }

    async fn find_job(&self, job_id: Uuid) -> Result<Option<MatchingJob>> {
        MatchingJob::find_by_id(job_id, &self.pool).await
    }

    async fn mark_processing(&self, job_id: Uuid, stage: &str, progress: i32) -> Result<()> {
        MatchingJob::mark_processing(job_id, stage, progress, &self.pool).await
    }

    async fn update_progress(&self, job_id: Uuid, progress: i32, stage: &str) -> Result<()> {
        MatchingJob::update_progress(job_id, progress, stage, &self.pool).await
    }

    async fn complete_job(&self, job_id: Uuid, search: SavedMatchSearch) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        let completed = sqlx::query(
            "UPDATE matching_jobs
             SET status = 'completed', progress = 100, stage = 'completed', completed_at = NOW()
             WHERE id = $1 AND status = 'processing'",
        )
        .bind(job_id)
        .execute(&mut *tx)
        .await?;

        if completed.rows_affected() == 0 {
            // Another writer (the timeout sweep) already resolved this job;
            // its result set must not overwrite the cache.
            warn!(%job_id, "job no longer processing at completion; cache not written");
            return Ok(());
        }

        search.upsert_in_tx(&mut tx).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn fail_job(&self, job_id: Uuid, error: &str) -> Result<()> {
        MatchingJob::mark_failed(job_id, error, &self.pool).await
    }

    async fn sweep_timed_out(&self, cutoff: DateTime<Utc>) -> Result<Vec<Uuid>> {
        MatchingJob::sweep_timed_out(
            cutoff,
            &MatchingError::Timeout.to_string(),
            &self.pool,
        )
        .await
    }

    async fn find_search(&self, target_user_id: Uuid) -> Result<Option<SavedMatchSearch>> {
        SavedMatchSearch::find_for_target(target_user_id, &self.pool).await
    }
}
