//! Read-only status/result projection for polling clients.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::warn;
use uuid::Uuid;

use crate::domains::matching::errors::MatchingError;
use crate::domains::matching::models::{MatchResult, MatchingJobStatus};
use crate::kernel::ServerDeps;

#[derive(Debug, Serialize)]
pub struct JobStatusResponse {
    pub job_id: Uuid,
    pub status: MatchingJobStatus,
    pub progress: i32,
    pub stage: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub results: Option<CompletedResults>,
}

#[derive(Debug, Serialize)]
pub struct CompletedResults {
    pub matches: Vec<MatchResult>,
    pub total_candidates_scanned: i32,
    pub algorithm_version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub saved_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Poll a job. While non-terminal this is status/progress/stage only; a
/// failed job carries its error; a completed job joins in the cached result
/// set for its target.
pub async fn get_job_status(
    job_id: Uuid,
    deps: &ServerDeps,
) -> Result<JobStatusResponse, MatchingError> {
    let job = deps
        .matching
        .find_job(job_id)
        .await?
        .ok_or(MatchingError::JobNotFound(job_id))?;

    let results = match job.status {
        MatchingJobStatus::Completed => {
            match deps.matching.find_search(job.target_user_id).await? {
                Some(search) => Some(CompletedResults {
                    matches: search.results,
                    total_candidates_scanned: search.total_candidates_scanned,
                    algorithm_version: search.algorithm_version,
                    saved_at: Some(search.saved_at),
                    duration_ms: job.duration_ms(),
                    message: None,
                }),
                // Defensive fallback: a completed job should always have a
                // cache entry. Report emptily rather than failing the poll.
                None => {
                    warn!(%job_id, target = %job.target_user_id, "completed job has no cached results");
                    Some(CompletedResults {
                        matches: Vec::new(),
                        total_candidates_scanned: 0,
                        algorithm_version: String::new(),
                        saved_at: None,
                        duration_ms: job.duration_ms(),
                        message: Some(
                            "match results are no longer available; submit a new search"
                                .to_string(),
                        ),
                    })
                }
            }
        }
        _ => None,
    };

    Ok(JobStatusResponse {
        job_id: job.id,
        status: job.status,
        progress: job.progress,
        stage: job.stage,
        error: job.error_message,
        results,
    })
}
