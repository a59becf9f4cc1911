//! The matching job worker.

use std::sync::Arc;

use chrono::Utc;
use tracing::{error, info, instrument};

use crate::domains::matching::errors::MatchingError;
use crate::domains::matching::models::{MatchingJob, SavedMatchSearch, ALGORITHM_VERSION};
use crate::domains::matching::utils::scoring::rank_candidates;
use crate::kernel::traits::VectorLookup;
use crate::kernel::ServerDeps;

/// Hand a freshly created job off to its own worker task.
pub fn spawn_matching_job(job: MatchingJob, deps: Arc<ServerDeps>) {
    tokio::spawn(async move {
        run_matching_job(job, &deps).await;
    });
}

/// Execute one matching job to a terminal state.
///
/// Every failure path lands in `Failed` with a captured error message; a
/// job is never left processing except across the I/O suspension points,
/// which the timeout sweep covers.
#[instrument(skip(job, deps), fields(job_id = %job.id, target = %job.target_user_id))]
pub async fn run_matching_job(job: MatchingJob, deps: &ServerDeps) {
    let job_id = job.id;
    if let Err(e) = execute(job, deps).await {
        error!(error = %e, "matching job failed");
        if let Err(mark) = deps.matching.fail_job(job_id, &e.to_string()).await {
            error!(error = %mark, "failed to record job failure");
        }
    }
}

async fn execute(job: MatchingJob, deps: &ServerDeps) -> Result<(), MatchingError> {
    deps.matching
        .mark_processing(job.id, "loading-target-vector", 5)
        .await?;

    let target_vector = match deps.vectors.get_vector(job.target_user_id).await? {
        VectorLookup::Ready(vector) => vector,
        VectorLookup::Pending => return Err(MatchingError::EmbeddingPending(job.target_user_id)),
        VectorLookup::NotFound => return Err(MatchingError::MissingEmbedding(job.target_user_id)),
    };

    deps.matching.update_progress(job.id, 25, "scoring").await?;
    let candidates = deps.vectors.get_vectors(&job.candidate_pool_ids).await?;
    let ranked = rank_candidates(&target_vector, &candidates, deps.matching_config.top_n);

    deps.matching.update_progress(job.id, 80, "saving").await?;
    let search = SavedMatchSearch {
        target_user_id: job.target_user_id,
        results: ranked
            .into_iter()
            .map(|candidate| candidate.into_match_result())
            .collect(),
        total_candidates_scanned: job.candidate_pool_ids.len() as i32,
        algorithm_version: ALGORITHM_VERSION.to_string(),
        saved_at: Utc::now(),
    };
    let found = search.results.len();
    deps.matching.complete_job(job.id, search).await?;

    info!(matches = found, "matching job completed");
    Ok(())
}
