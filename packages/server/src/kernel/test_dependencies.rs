// In-memory implementations for testing
//
// Mirrors the semantics the Postgres stores get from SQL (compare-and-swap
// status writes, single-flight job creation, monotone progress) behind a
// Mutex, so lifecycle and pipeline logic can be exercised without a
// database.

use std::collections::HashMap;
use std::sync::Mutex;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::warn;
use uuid::Uuid;

use crate::domains::matching::errors::MatchingError;
use crate::domains::matching::models::{MatchingJob, MatchingJobStatus, ProfileVector, SavedMatchSearch};
use crate::domains::matching::store::MatchingStore;
use crate::domains::suggestions::events::SuggestionEvent;
use crate::domains::suggestions::machines::SuggestionStatus;
use crate::domains::suggestions::models::{NewSuggestion, Party, StatusHistoryEntry, Suggestion};
use crate::domains::suggestions::store::{PairConflict, SuggestionStore};
use crate::kernel::traits::{BaseNotificationDispatcher, BaseVectorProvider, VectorLookup};

// =============================================================================
// In-memory suggestion store
// =============================================================================

#[derive(Default)]
pub struct InMemorySuggestionStore {
    suggestions: Mutex<HashMap<Uuid, Suggestion>>,
    history: Mutex<Vec<StatusHistoryEntry>>,
    pair_lookup_misses: Mutex<u32>,
}

impl InMemorySuggestionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Test helper: make the next pair lookup report nothing, simulating a
    /// concurrent writer committing between a caller's pre-check and its
    /// insert. The insert-side uniqueness guard still applies.
    pub fn miss_next_pair_lookup(&self) {
        *self.pair_lookup_misses.lock().unwrap() += 1;
    }

    /// Test helper: force a status without validation or history, to set up
    /// arbitrary starting states.
    pub fn set_status_unchecked(&self, id: Uuid, status: SuggestionStatus) {
        if let Some(suggestion) = self.suggestions.lock().unwrap().get_mut(&id) {
            suggestion.status = status;
        }
    }

    fn append_history(
        history: &mut Vec<StatusHistoryEntry>,
        suggestion_id: Uuid,
        status: SuggestionStatus,
        note: Option<String>,
    ) {
        history.push(StatusHistoryEntry {
            id: Uuid::now_v7(),
            suggestion_id,
            status,
            note,
            created_at: Utc::now(),
        });
    }
}

#[async_trait]
impl SuggestionStore for InMemorySuggestionStore {
    async fn insert(&self, new: NewSuggestion) -> Result<Suggestion> {
        let mut suggestions = self.suggestions.lock().unwrap();
        let duplicate = suggestions.values().any(|s| {
            !s.status.is_terminal()
                && ((s.first_party_id == new.first_party_id
                    && s.second_party_id == new.second_party_id)
                    || (s.first_party_id == new.second_party_id
                        && s.second_party_id == new.first_party_id))
        });
        if duplicate {
            return Err(anyhow::Error::new(PairConflict));
        }

        let now = Utc::now();
        let suggestion = Suggestion {
            id: Uuid::now_v7(),
            first_party_id: new.first_party_id,
            second_party_id: new.second_party_id,
            matchmaker_id: new.matchmaker_id,
            status: SuggestionStatus::Draft,
            priority: new.priority,
            internal_note: new.internal_note,
            note_for_first_party: new.note_for_first_party,
            note_for_second_party: new.note_for_second_party,
            decision_deadline: new.decision_deadline,
            response_deadline: new.response_deadline,
            first_party_last_viewed_at: None,
            second_party_last_viewed_at: None,
            created_at: now,
            last_activity: now,
            closed_at: None,
        };
        suggestions.insert(suggestion.id, suggestion.clone());
        Self::append_history(
            &mut self.history.lock().unwrap(),
            suggestion.id,
            SuggestionStatus::Draft,
            Some("suggestion created".to_string()),
        );
        Ok(suggestion)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Suggestion>> {
        Ok(self.suggestions.lock().unwrap().get(&id).cloned())
    }

    async fn find_active_for_pair(&self, a: Uuid, b: Uuid) -> Result<Option<Suggestion>> {
        {
            let mut misses = self.pair_lookup_misses.lock().unwrap();
            if *misses > 0 {
                *misses -= 1;
                return Ok(None);
            }
        }
        Ok(self
            .suggestions
            .lock()
            .unwrap()
            .values()
            .find(|s| {
                !s.status.is_terminal()
                    && ((s.first_party_id == a && s.second_party_id == b)
                        || (s.first_party_id == b && s.second_party_id == a))
            })
            .cloned())
    }

    async fn record_transition(
        &self,
        id: Uuid,
        from: SuggestionStatus,
        to: SuggestionStatus,
        note: Option<String>,
    ) -> Result<Option<Suggestion>> {
        let mut suggestions = self.suggestions.lock().unwrap();
        let Some(suggestion) = suggestions.get_mut(&id) else {
            return Ok(None);
        };
        if suggestion.status != from {
            return Ok(None);
        }
        let now = Utc::now();
        suggestion.status = to;
        suggestion.last_activity = now;
        if to.is_terminal() {
            suggestion.closed_at = Some(now);
        }
        let updated = suggestion.clone();
        Self::append_history(&mut self.history.lock().unwrap(), id, to, note);
        Ok(Some(updated))
    }

    async fn history(&self, suggestion_id: Uuid) -> Result<Vec<StatusHistoryEntry>> {
        Ok(self
            .history
            .lock()
            .unwrap()
            .iter()
            .filter(|entry| entry.suggestion_id == suggestion_id)
            .cloned()
            .collect())
    }

    async fn find_deadline_passed(&self, now: DateTime<Utc>) -> Result<Vec<Suggestion>> {
        Ok(self
            .suggestions
            .lock()
            .unwrap()
            .values()
            .filter(|s| {
                !s.status.is_terminal()
                    && (s.response_deadline.is_some_and(|d| d < now)
                        || s.decision_deadline.is_some_and(|d| d < now))
            })
            .cloned()
            .collect())
    }

    async fn mark_viewed(&self, id: Uuid, party: Party, at: DateTime<Utc>) -> Result<()> {
        if let Some(suggestion) = self.suggestions.lock().unwrap().get_mut(&id) {
            match party {
                Party::First => suggestion.first_party_last_viewed_at = Some(at),
                Party::Second => suggestion.second_party_last_viewed_at = Some(at),
            }
        }
        Ok(())
    }
}

// =============================================================================
// In-memory matching store
// =============================================================================

#[derive(Default)]
pub struct InMemoryMatchingStore {
    jobs: Mutex<HashMap<Uuid, MatchingJob>>,
    searches: Mutex<HashMap<Uuid, SavedMatchSearch>>,
}

impl InMemoryMatchingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Test helper: backdate a processing job so the timeout sweep sees it.
    pub fn set_started_at(&self, job_id: Uuid, started_at: DateTime<Utc>) {
        if let Some(job) = self.jobs.lock().unwrap().get_mut(&job_id) {
            job.started_at = Some(started_at);
        }
    }

    /// Test helper: drop a cache entry to exercise the completed-job
    /// fallback path.
    pub fn remove_search(&self, target_user_id: Uuid) {
        self.searches.lock().unwrap().remove(&target_user_id);
    }
}

#[async_trait]
impl MatchingStore for InMemoryMatchingStore {
    async fn find_or_create_job(&self, job: MatchingJob) -> Result<(MatchingJob, bool)> {
        let mut jobs = self.jobs.lock().unwrap();
        if let Some(active) = jobs
            .values()
            .find(|j| j.target_user_id == job.target_user_id && !j.status.is_terminal())
        {
            return Ok((active.clone(), false));
        }
        jobs.insert(job.id, job.clone());
        Ok((job, true))
    }

    async fn find_job(&self, job_id: Uuid) -> Result<Option<MatchingJob>> {
        Ok(self.jobs.lock().unwrap().get(&job_id).cloned())
    }

    async fn mark_processing(&self, job_id: Uuid, stage: &str, progress: i32) -> Result<()> {
        if let Some(job) = self.jobs.lock().unwrap().get_mut(&job_id) {
            if job.status == MatchingJobStatus::Pending {
                job.status = MatchingJobStatus::Processing;
                job.stage = stage.to_string();
                job.progress = job.progress.max(progress);
                job.started_at = Some(Utc::now());
            }
        }
        Ok(())
    }

    async fn update_progress(&self, job_id: Uuid, progress: i32, stage: &str) -> Result<()> {
        if let Some(job) = self.jobs.lock().unwrap().get_mut(&job_id) {
            if job.status == MatchingJobStatus::Processing {
                job.progress = job.progress.max(progress);
                job.stage = stage.to_string();
            }
        }
        Ok(())
    }

    async fn complete_job(&self, job_id: Uuid, search: SavedMatchSearch) -> Result<()> {
        let mut jobs = self.jobs.lock().unwrap();
        let Some(job) = jobs.get_mut(&job_id) else {
            return Ok(());
        };
        if job.status != MatchingJobStatus::Processing {
            warn!(%job_id, "job no longer processing at completion; cache not written");
            return Ok(());
        }
        job.status = MatchingJobStatus::Completed;
        job.progress = 100;
        job.stage = "completed".to_string();
        job.completed_at = Some(Utc::now());
        self.searches
            .lock()
            .unwrap()
            .insert(search.target_user_id, search);
        Ok(())
    }

    async fn fail_job(&self, job_id: Uuid, error: &str) -> Result<()> {
        if let Some(job) = self.jobs.lock().unwrap().get_mut(&job_id) {
            if !job.status.is_terminal() {
                job.status = MatchingJobStatus::Failed;
                job.error_message = Some(error.to_string());
                job.completed_at = Some(Utc::now());
            }
        }
        Ok(())
    }

    async fn sweep_timed_out(&self, cutoff: DateTime<Utc>) -> Result<Vec<Uuid>> {
        let mut swept = Vec::new();
        for job in self.jobs.lock().unwrap().values_mut() {
            let stuck = match job.status {
                MatchingJobStatus::Processing => {
                    job.started_at.is_some_and(|started| started < cutoff)
                }
                MatchingJobStatus::Pending => job.created_at < cutoff,
                _ => false,
            };
            if stuck {
                job.status = MatchingJobStatus::Failed;
                job.error_message = Some(MatchingError::Timeout.to_string());
                job.completed_at = Some(Utc::now());
                swept.push(job.id);
            }
        }
        Ok(swept)
    }

    async fn find_search(&self, target_user_id: Uuid) -> Result<Option<SavedMatchSearch>> {
        Ok(self.searches.lock().unwrap().get(&target_user_id).cloned())
    }
}

// =============================================================================
// Static vector provider
// =============================================================================

/// Vector provider preloaded with fixed embeddings.
#[derive(Default)]
pub struct StaticVectorProvider {
    vectors: Mutex<HashMap<Uuid, VectorLookup>>,
}

impl StaticVectorProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_vector(self, profile_id: Uuid, embedding: Vec<f32>) -> Self {
        self.vectors
            .lock()
            .unwrap()
            .insert(profile_id, VectorLookup::Ready(embedding));
        self
    }

    /// Profile whose embedding generation is queued but not finished.
    pub fn with_pending(self, profile_id: Uuid) -> Self {
        self.vectors
            .lock()
            .unwrap()
            .insert(profile_id, VectorLookup::Pending);
        self
    }
}

#[async_trait]
impl BaseVectorProvider for StaticVectorProvider {
    async fn get_vector(&self, profile_id: Uuid) -> Result<VectorLookup> {
        Ok(self
            .vectors
            .lock()
            .unwrap()
            .get(&profile_id)
            .cloned()
            .unwrap_or(VectorLookup::NotFound))
    }

    async fn get_vectors(&self, profile_ids: &[Uuid]) -> Result<Vec<ProfileVector>> {
        let vectors = self.vectors.lock().unwrap();
        Ok(profile_ids
            .iter()
            .filter_map(|id| match vectors.get(id) {
                Some(VectorLookup::Ready(embedding)) => Some(ProfileVector {
                    profile_id: *id,
                    embedding: embedding.clone(),
                }),
                _ => None,
            })
            .collect())
    }
}

// =============================================================================
// Recording dispatcher
// =============================================================================

/// Captures dispatched events for assertions; optionally fails every
/// dispatch to prove delivery errors never roll back transitions.
#[derive(Default)]
pub struct RecordingDispatcher {
    events: Mutex<Vec<SuggestionEvent>>,
    fail: bool,
}

impl RecordingDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            events: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn events(&self) -> Vec<SuggestionEvent> {
        self.events.lock().unwrap().clone()
    }
}

#[async_trait]
impl BaseNotificationDispatcher for RecordingDispatcher {
    async fn dispatch(&self, event: SuggestionEvent) -> Result<()> {
        self.events.lock().unwrap().push(event);
        if self.fail {
            return Err(anyhow!("dispatcher offline"));
        }
        Ok(())
    }
}
