//! Submit a matching search for a target person.

use std::sync::Arc;

use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::common::Actor;
use crate::domains::matching::errors::MatchingError;
use crate::domains::matching::jobs::spawn_matching_job;
use crate::domains::matching::models::MatchingJob;
use crate::kernel::ServerDeps;

#[derive(Debug, Serialize)]
pub struct SubmitOutcome {
    pub job_id: Uuid,
    /// True when an earlier non-terminal job for this target absorbed the
    /// submission (idempotent submit).
    pub already_running: bool,
}

/// Create a matching job and hand it to a worker, returning immediately.
///
/// Submission is idempotent per target: while a non-terminal job exists for
/// `target_user_id`, further submits return its id instead of creating a
/// duplicate. A retry after a failure is a fresh call to this function.
pub async fn submit_matching_job(
    target_user_id: Uuid,
    candidate_pool_ids: Vec<Uuid>,
    actor: &Actor,
    deps: &Arc<ServerDeps>,
) -> Result<SubmitOutcome, MatchingError> {
    if !actor.is_matchmaker() && !actor.is_privileged() {
        return Err(MatchingError::Unauthorized);
    }

    if candidate_pool_ids.is_empty() {
        return Err(MatchingError::EmptyCandidatePool);
    }
    if candidate_pool_ids.contains(&target_user_id) {
        return Err(MatchingError::TargetInPool);
    }

    let mut pool = candidate_pool_ids;
    pool.sort();
    pool.dedup();

    let job = MatchingJob::builder()
        .target_user_id(target_user_id)
        .candidate_pool_ids(pool)
        .build();

    let (job, created) = deps.matching.find_or_create_job(job).await?;
    if created {
        info!(job_id = %job.id, target = %target_user_id, "matching job submitted");
        spawn_matching_job(job.clone(), Arc::clone(deps));
    } else {
        info!(job_id = %job.id, target = %target_user_id, "reusing in-flight matching job");
    }

    Ok(SubmitOutcome {
        job_id: job.id,
        already_running: !created,
    })
}
