//! Matching job model - one row per asynchronous match search.

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use typed_builder::TypedBuilder;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, Default)]
#[sqlx(type_name = "matching_job_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum MatchingJobStatus {
    #[default]
    Pending,
    Processing,
    Completed,
    Failed,
}

impl MatchingJobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, MatchingJobStatus::Completed | MatchingJobStatus::Failed)
    }
}

/// One asynchronous match search for a target person.
///
/// `progress` is monotonically non-decreasing while the job is processing;
/// the update statements clamp with `GREATEST` so a stale writer can never
/// move it backwards.
#[derive(FromRow, Debug, Clone, Serialize, TypedBuilder)]
#[builder(field_defaults(setter(into)))]
pub struct MatchingJob {
    #[builder(default = Uuid::now_v7())]
    pub id: Uuid,
    pub target_user_id: Uuid,
    pub candidate_pool_ids: Vec<Uuid>,
    #[builder(default)]
    pub status: MatchingJobStatus,
    #[builder(default = 0)]
    pub progress: i32,
    #[builder(default = "queued".to_string())]
    pub stage: String,
    #[builder(default, setter(strip_option))]
    pub error_message: Option<String>,
    #[builder(default = Utc::now())]
    pub created_at: DateTime<Utc>,
    #[builder(default, setter(strip_option))]
    pub started_at: Option<DateTime<Utc>>,
    #[builder(default, setter(strip_option))]
    pub completed_at: Option<DateTime<Utc>>,
}

impl MatchingJob {
    /// Wall-clock duration of a finished job, in milliseconds.
    pub fn duration_ms(&self) -> Option<i64> {
        match (self.started_at, self.completed_at) {
            (Some(started), Some(completed)) => Some((completed - started).num_milliseconds()),
            _ => None,
        }
    }

    pub async fn find_by_id(id: Uuid, pool: &PgPool) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>("SELECT * FROM matching_jobs WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
            .map_err(Into::into)
    }

    /// Insert this job unless a non-terminal job already exists for the
    /// target; returns `(job, created)`. The partial unique index on active
    /// targets makes the guard race-safe.
    pub async fn insert_unless_active(&self, pool: &PgPool) -> Result<(Self, bool)> {
        let inserted = sqlx::query_as::<_, Self>(
            "INSERT INTO matching_jobs (id, target_user_id, candidate_pool_ids, status, progress, stage)
             VALUES ($1, $2, $3, 'pending', 0, 'queued')
             ON CONFLICT (target_user_id) WHERE status IN ('pending', 'processing') DO NOTHING
             RETURNING *",
        )
        .bind(self.id)
        .bind(self.target_user_id)
        .bind(&self.candidate_pool_ids)
        .fetch_optional(pool)
        .await?;

        if let Some(job) = inserted {
            return Ok((job, true));
        }

        let existing = sqlx::query_as::<_, Self>(
            "SELECT * FROM matching_jobs
             WHERE target_user_id = $1 AND status IN ('pending', 'processing')
             LIMIT 1",
        )
        .bind(self.target_user_id)
        .fetch_one(pool)
        .await?;
        Ok((existing, false))
    }

    /// Move a pending job to processing, stamping `started_at`.
    pub async fn mark_processing(id: Uuid, stage: &str, progress: i32, pool: &PgPool) -> Result<()> {
        sqlx::query(
            "UPDATE matching_jobs
             SET status = 'processing', stage = $2, progress = GREATEST(progress, $3),
                 started_at = NOW()
             WHERE id = $1 AND status = 'pending'",
        )
        .bind(id)
        .bind(stage)
        .bind(progress)
        .execute(pool)
        .await?;
        Ok(())
    }

    pub async fn update_progress(id: Uuid, progress: i32, stage: &str, pool: &PgPool) -> Result<()> {
        sqlx::query(
            "UPDATE matching_jobs
             SET progress = GREATEST(progress, $2), stage = $3
             WHERE id = $1 AND status = 'processing'",
        )
        .bind(id)
        .bind(progress)
        .bind(stage)
        .execute(pool)
        .await?;
        Ok(())
    }

    pub async fn mark_failed(id: Uuid, error: &str, pool: &PgPool) -> Result<()> {
        sqlx::query(
            "UPDATE matching_jobs
             SET status = 'failed', error_message = $2, completed_at = NOW()
             WHERE id = $1 AND status IN ('pending', 'processing')",
        )
        .bind(id)
        .bind(error)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Fail every job stuck since before `cutoff`: processing jobs by their
    /// start time, and pending jobs no worker ever picked up by their
    /// creation time. A pending job left behind would otherwise hold the
    /// single-flight guard for its target forever.
    pub async fn sweep_timed_out(
        cutoff: DateTime<Utc>,
        error: &str,
        pool: &PgPool,
    ) -> Result<Vec<Uuid>> {
        let rows = sqlx::query_as::<_, (Uuid,)>(
            "UPDATE matching_jobs
             SET status = 'failed', error_message = $2, completed_at = NOW()
             WHERE (status = 'processing' AND started_at < $1)
                OR (status = 'pending' AND created_at < $1)
             RETURNING id",
        )
        .bind(cutoff)
        .bind(error)
        .fetch_all(pool)
        .await?;
        Ok(rows.into_iter().map(|(id,)| id).collect())
    }
}
