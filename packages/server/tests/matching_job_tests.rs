//! Integration tests for the asynchronous matching pipeline.
//!
//! Jobs run on real spawned workers against the in-memory stores; tests
//! observe them the way clients do, by polling the status projection.

mod common;

use chrono::{Duration, Utc};
use uuid::Uuid;

use crate::common::{admin, matchmaker, party, TestHarness};
use server_core::domains::matching::actions::{
    get_job_status, submit_matching_job, JobStatusResponse,
};
use server_core::domains::matching::errors::MatchingError;
use server_core::domains::matching::models::{MatchingJob, MatchingJobStatus};
use server_core::kernel::run_job_timeout_sweep;
use server_core::kernel::test_dependencies::StaticVectorProvider;

async fn wait_for_terminal(harness: &TestHarness, job_id: Uuid) -> JobStatusResponse {
    for _ in 0..200 {
        let status = get_job_status(job_id, &harness.deps).await.unwrap();
        if status.status.is_terminal() {
            return status;
        }
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    }
    panic!("job {job_id} did not reach a terminal state");
}

// =============================================================================
// End-to-end pipeline
// =============================================================================

#[tokio::test]
async fn completed_job_returns_ranked_results() {
    let target = Uuid::new_v4();
    let close = Uuid::new_v4();
    let mid = Uuid::new_v4();
    let orthogonal = Uuid::new_v4();
    let opposite = Uuid::new_v4();

    let harness = TestHarness::with_vectors(
        StaticVectorProvider::new()
            .with_vector(target, vec![1.0, 0.0])
            .with_vector(close, vec![2.0, 0.0])
            .with_vector(mid, vec![0.6, 0.8])
            .with_vector(orthogonal, vec![0.0, 1.0])
            .with_vector(opposite, vec![-1.0, 0.0]),
    );

    let outcome = submit_matching_job(
        target,
        vec![mid, close, opposite, orthogonal],
        &matchmaker(),
        &harness.deps,
    )
    .await
    .unwrap();
    assert!(!outcome.already_running);

    let status = wait_for_terminal(&harness, outcome.job_id).await;
    assert_eq!(status.status, MatchingJobStatus::Completed);
    assert_eq!(status.progress, 100);
    assert_eq!(status.stage, "completed");
    assert!(status.error.is_none());

    let results = status.results.expect("completed job must carry results");
    let ranked: Vec<_> = results
        .matches
        .iter()
        .map(|m| (m.candidate_id, m.score))
        .collect();
    assert_eq!(
        ranked,
        vec![(close, 100), (mid, 60), (orthogonal, 0), (opposite, 0)]
    );
    assert_eq!(results.total_candidates_scanned, 4);
    assert_eq!(results.algorithm_version, "cosine-v1");
    assert!(results.saved_at.is_some());
    assert!(results.duration_ms.is_some());
}

#[tokio::test]
async fn completed_results_survive_repeated_polls() {
    let target = Uuid::new_v4();
    let candidate = Uuid::new_v4();
    let harness = TestHarness::with_vectors(
        StaticVectorProvider::new()
            .with_vector(target, vec![1.0, 0.0])
            .with_vector(candidate, vec![1.0, 0.0]),
    );

    let outcome = submit_matching_job(target, vec![candidate], &matchmaker(), &harness.deps)
        .await
        .unwrap();
    let first_poll = wait_for_terminal(&harness, outcome.job_id).await;
    let second_poll = get_job_status(outcome.job_id, &harness.deps).await.unwrap();

    assert_eq!(second_poll.status, MatchingJobStatus::Completed);
    assert_eq!(
        first_poll.results.unwrap().matches,
        second_poll.results.unwrap().matches
    );
}

#[tokio::test]
async fn ties_break_on_ascending_candidate_id() {
    let target = Uuid::new_v4();
    let mut twins = [Uuid::new_v4(), Uuid::new_v4()];
    twins.sort();

    let harness = TestHarness::with_vectors(
        StaticVectorProvider::new()
            .with_vector(target, vec![1.0, 0.0])
            .with_vector(twins[0], vec![3.0, 0.0])
            .with_vector(twins[1], vec![3.0, 0.0]),
    );

    // Submit in descending id order to prove the order is not insertion order.
    let outcome = submit_matching_job(target, vec![twins[1], twins[0]], &matchmaker(), &harness.deps)
        .await
        .unwrap();
    let status = wait_for_terminal(&harness, outcome.job_id).await;

    let ids: Vec<_> = status
        .results
        .unwrap()
        .matches
        .iter()
        .map(|m| m.candidate_id)
        .collect();
    assert_eq!(ids, twins.to_vec());
}

#[tokio::test]
async fn result_set_is_capped() {
    let target = Uuid::new_v4();
    let mut provider = StaticVectorProvider::new().with_vector(target, vec![1.0, 0.0]);
    let mut pool = Vec::new();
    for i in 0..25 {
        let candidate = Uuid::new_v4();
        provider = provider.with_vector(candidate, vec![1.0, i as f32 * 0.1]);
        pool.push(candidate);
    }

    let harness = TestHarness::with_vectors(provider);
    let outcome = submit_matching_job(target, pool, &matchmaker(), &harness.deps)
        .await
        .unwrap();
    let status = wait_for_terminal(&harness, outcome.job_id).await;

    let results = status.results.unwrap();
    assert_eq!(results.matches.len(), 20);
    assert_eq!(results.total_candidates_scanned, 25);
}

#[tokio::test]
async fn candidates_without_embeddings_are_skipped() {
    let target = Uuid::new_v4();
    let scored = Uuid::new_v4();
    let unembedded = Uuid::new_v4();

    let harness = TestHarness::with_vectors(
        StaticVectorProvider::new()
            .with_vector(target, vec![1.0, 0.0])
            .with_vector(scored, vec![1.0, 0.0]),
    );

    let outcome = submit_matching_job(target, vec![scored, unembedded], &matchmaker(), &harness.deps)
        .await
        .unwrap();
    let status = wait_for_terminal(&harness, outcome.job_id).await;

    let results = status.results.unwrap();
    assert_eq!(results.matches.len(), 1);
    assert_eq!(results.matches[0].candidate_id, scored);
    assert_eq!(results.total_candidates_scanned, 2);
}

// =============================================================================
// Submission rules
// =============================================================================

#[tokio::test]
async fn submit_is_idempotent_while_a_job_is_active() {
    let target = Uuid::new_v4();
    let candidate = Uuid::new_v4();
    let harness = TestHarness::with_vectors(
        StaticVectorProvider::new()
            .with_vector(target, vec![1.0, 0.0])
            .with_vector(candidate, vec![1.0, 0.0]),
    );
    let mm = matchmaker();

    let first = submit_matching_job(target, vec![candidate], &mm, &harness.deps)
        .await
        .unwrap();
    let second = submit_matching_job(target, vec![candidate], &mm, &harness.deps)
        .await
        .unwrap();
    assert!(!first.already_running);
    assert!(second.already_running);
    assert_eq!(first.job_id, second.job_id);

    // Once the job is terminal a new submission creates a fresh job.
    wait_for_terminal(&harness, first.job_id).await;
    let third = submit_matching_job(target, vec![candidate], &mm, &harness.deps)
        .await
        .unwrap();
    assert!(!third.already_running);
    assert_ne!(third.job_id, first.job_id);
}

#[tokio::test]
async fn submission_validates_pool_and_role() {
    let harness = TestHarness::new();
    let target = Uuid::new_v4();
    let candidate = Uuid::new_v4();

    let err = submit_matching_job(target, vec![], &matchmaker(), &harness.deps)
        .await
        .unwrap_err();
    assert!(matches!(err, MatchingError::EmptyCandidatePool));

    let err = submit_matching_job(target, vec![candidate, target], &matchmaker(), &harness.deps)
        .await
        .unwrap_err();
    assert!(matches!(err, MatchingError::TargetInPool));

    let err = submit_matching_job(target, vec![candidate], &party(Uuid::new_v4()), &harness.deps)
        .await
        .unwrap_err();
    assert!(matches!(err, MatchingError::Unauthorized));

    // Administrators may submit on behalf of anyone.
    submit_matching_job(target, vec![candidate], &admin(), &harness.deps)
        .await
        .expect("admin submission should be accepted");
}

#[tokio::test]
async fn polling_an_unknown_job_is_not_found() {
    let harness = TestHarness::new();
    let err = get_job_status(Uuid::new_v4(), &harness.deps).await.unwrap_err();
    assert!(matches!(err, MatchingError::JobNotFound(_)));
}

// =============================================================================
// Failure paths
// =============================================================================

#[tokio::test]
async fn missing_target_embedding_fails_the_job() {
    let harness = TestHarness::new();
    let target = Uuid::new_v4();

    let outcome = submit_matching_job(target, vec![Uuid::new_v4()], &matchmaker(), &harness.deps)
        .await
        .unwrap();
    let status = wait_for_terminal(&harness, outcome.job_id).await;

    assert_eq!(status.status, MatchingJobStatus::Failed);
    assert!(status.results.is_none());
    let error = status.error.expect("failed job must carry its error");
    assert!(error.contains("no embedding"), "unexpected error: {error}");
}

#[tokio::test]
async fn pending_target_embedding_fails_the_job() {
    let target = Uuid::new_v4();
    let harness =
        TestHarness::with_vectors(StaticVectorProvider::new().with_pending(target));

    let outcome = submit_matching_job(target, vec![Uuid::new_v4()], &matchmaker(), &harness.deps)
        .await
        .unwrap();
    let status = wait_for_terminal(&harness, outcome.job_id).await;

    assert_eq!(status.status, MatchingJobStatus::Failed);
    let error = status.error.unwrap();
    assert!(error.contains("not ready"), "unexpected error: {error}");
}

#[tokio::test]
async fn timeout_sweep_fails_stale_jobs() {
    let harness = TestHarness::new();
    let target = Uuid::new_v4();
    let recent_target = Uuid::new_v4();

    let stale = MatchingJob::builder()
        .target_user_id(target)
        .candidate_pool_ids(vec![Uuid::new_v4()])
        .build();
    let (stale, _) = harness.deps.matching.find_or_create_job(stale).await.unwrap();
    harness
        .deps
        .matching
        .mark_processing(stale.id, "scoring", 25)
        .await
        .unwrap();
    harness
        .matching
        .set_started_at(stale.id, Utc::now() - Duration::minutes(30));

    let recent = MatchingJob::builder()
        .target_user_id(recent_target)
        .candidate_pool_ids(vec![Uuid::new_v4()])
        .build();
    let (recent, _) = harness.deps.matching.find_or_create_job(recent).await.unwrap();
    harness
        .deps
        .matching
        .mark_processing(recent.id, "scoring", 25)
        .await
        .unwrap();

    let swept = run_job_timeout_sweep(&harness.deps).await.unwrap();
    assert_eq!(swept, 1);

    let status = get_job_status(stale.id, &harness.deps).await.unwrap();
    assert_eq!(status.status, MatchingJobStatus::Failed);
    assert_eq!(status.error.as_deref(), Some("Timeout"));

    let status = get_job_status(recent.id, &harness.deps).await.unwrap();
    assert_eq!(status.status, MatchingJobStatus::Processing);

    // The failed job no longer blocks a fresh submission for its target.
    let resubmit = submit_matching_job(target, vec![Uuid::new_v4()], &matchmaker(), &harness.deps)
        .await
        .unwrap();
    assert!(!resubmit.already_running);
    assert_ne!(resubmit.job_id, stale.id);
}

#[tokio::test]
async fn timeout_sweep_reclaims_abandoned_pending_jobs() {
    let harness = TestHarness::new();
    let target = Uuid::new_v4();

    // Inserted but never picked up by a worker, e.g. a crash right after the
    // submit committed. Left alone it would hold the single-flight guard for
    // its target forever.
    let abandoned = MatchingJob::builder()
        .target_user_id(target)
        .candidate_pool_ids(vec![Uuid::new_v4()])
        .created_at(Utc::now() - Duration::minutes(30))
        .build();
    let (abandoned, _) = harness.deps.matching.find_or_create_job(abandoned).await.unwrap();

    let fresh = MatchingJob::builder()
        .target_user_id(Uuid::new_v4())
        .candidate_pool_ids(vec![Uuid::new_v4()])
        .build();
    let (fresh, _) = harness.deps.matching.find_or_create_job(fresh).await.unwrap();

    let swept = run_job_timeout_sweep(&harness.deps).await.unwrap();
    assert_eq!(swept, 1);

    let status = get_job_status(abandoned.id, &harness.deps).await.unwrap();
    assert_eq!(status.status, MatchingJobStatus::Failed);
    assert_eq!(status.error.as_deref(), Some("Timeout"));

    let status = get_job_status(fresh.id, &harness.deps).await.unwrap();
    assert_eq!(status.status, MatchingJobStatus::Pending);

    // The target is submittable again.
    let resubmit = submit_matching_job(target, vec![Uuid::new_v4()], &matchmaker(), &harness.deps)
        .await
        .unwrap();
    assert!(!resubmit.already_running);
    assert_ne!(resubmit.job_id, abandoned.id);
}

// =============================================================================
// Result cache
// =============================================================================

#[tokio::test]
async fn new_search_overwrites_the_cached_results() {
    let target = Uuid::new_v4();
    let old_match = Uuid::new_v4();
    let new_match = Uuid::new_v4();
    let harness = TestHarness::with_vectors(
        StaticVectorProvider::new()
            .with_vector(target, vec![1.0, 0.0])
            .with_vector(old_match, vec![1.0, 0.0])
            .with_vector(new_match, vec![1.0, 0.0]),
    );
    let mm = matchmaker();

    let first = submit_matching_job(target, vec![old_match], &mm, &harness.deps)
        .await
        .unwrap();
    wait_for_terminal(&harness, first.job_id).await;

    let second = submit_matching_job(target, vec![new_match], &mm, &harness.deps)
        .await
        .unwrap();
    let status = wait_for_terminal(&harness, second.job_id).await;

    let matches = status.results.unwrap().matches;
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].candidate_id, new_match);

    let cached = harness.deps.matching.find_search(target).await.unwrap().unwrap();
    assert_eq!(cached.results.len(), 1);
    assert_eq!(cached.results[0].candidate_id, new_match);
}

#[tokio::test]
async fn missing_cache_entry_degrades_gracefully() {
    let target = Uuid::new_v4();
    let candidate = Uuid::new_v4();
    let harness = TestHarness::with_vectors(
        StaticVectorProvider::new()
            .with_vector(target, vec![1.0, 0.0])
            .with_vector(candidate, vec![1.0, 0.0]),
    );

    let outcome = submit_matching_job(target, vec![candidate], &matchmaker(), &harness.deps)
        .await
        .unwrap();
    wait_for_terminal(&harness, outcome.job_id).await;

    harness.matching.remove_search(target);

    let status = get_job_status(outcome.job_id, &harness.deps).await.unwrap();
    assert_eq!(status.status, MatchingJobStatus::Completed);
    let results = status.results.unwrap();
    assert!(results.matches.is_empty());
    assert!(results.message.is_some());
}

// =============================================================================
// Progress bookkeeping
// =============================================================================

#[tokio::test]
async fn progress_never_moves_backwards() {
    let harness = TestHarness::new();
    let job = MatchingJob::builder()
        .target_user_id(Uuid::new_v4())
        .candidate_pool_ids(vec![Uuid::new_v4()])
        .build();
    let (job, _) = harness.deps.matching.find_or_create_job(job).await.unwrap();

    harness
        .deps
        .matching
        .mark_processing(job.id, "loading-target-vector", 5)
        .await
        .unwrap();
    harness
        .deps
        .matching
        .update_progress(job.id, 50, "scoring")
        .await
        .unwrap();
    harness
        .deps
        .matching
        .update_progress(job.id, 25, "saving")
        .await
        .unwrap();

    let current = harness.deps.matching.find_job(job.id).await.unwrap().unwrap();
    assert_eq!(current.progress, 50);
    assert_eq!(current.stage, "saving");
}
