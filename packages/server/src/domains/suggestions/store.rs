//! Storage seam for the suggestions domain.
//!
//! Actions never touch a pool directly; they go through [`SuggestionStore`]
//! so the lifecycle logic can be exercised against the in-memory store in
//! `kernel::test_dependencies`.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

use crate::domains::suggestions::machines::SuggestionStatus;
use crate::domains::suggestions::models::{NewSuggestion, Party, StatusHistoryEntry, Suggestion};

/// Marker error carried in [`SuggestionStore::insert`] failures when the
/// active-pair uniqueness guard rejects the row. Lets callers distinguish a
/// lost duplicate race from a real storage failure.
#[derive(Debug, Error)]
#[error("an active suggestion already exists for this pair")]
pub struct PairConflict;

#[async_trait]
pub trait SuggestionStore: Send + Sync {
    /// Insert a draft suggestion plus its initial history row. Fails with a
    /// downcastable [`PairConflict`] when the pair already has an active
    /// suggestion.
    async fn insert(&self, new: NewSuggestion) -> Result<Suggestion>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Suggestion>>;

    /// A non-terminal suggestion for this pair, in either party order.
    async fn find_active_for_pair(&self, a: Uuid, b: Uuid) -> Result<Option<Suggestion>>;

    /// Compare-and-swap: apply `from -> to` and append a history row in one
    /// transaction. Returns `None` when the row is no longer in `from`.
    async fn record_transition(
        &self,
        id: Uuid,
        from: SuggestionStatus,
        to: SuggestionStatus,
        note: Option<String>,
    ) -> Result<Option<Suggestion>>;

    async fn history(&self, suggestion_id: Uuid) -> Result<Vec<StatusHistoryEntry>>;

    /// Non-terminal suggestions whose response or decision deadline passed.
    async fn find_deadline_passed(&self, now: DateTime<Utc>) -> Result<Vec<Suggestion>>;

    async fn mark_viewed(&self, id: Uuid, party: Party, at: DateTime<Utc>) -> Result<()>;
}

/// Postgres-backed store; delegates to the model layer.
pub struct PostgresSuggestionStore {
    pool: PgPool,
}

impl PostgresSuggestionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// Postgres unique-violation SQLSTATE.
const UNIQUE_VIOLATION: &str = "23505";

fn map_pair_conflict(e: anyhow::Error) -> anyhow::Error {
    let unique_violation = e
        .downcast_ref::<sqlx::Error>()
        .and_then(|e| e.as_database_error())
        .and_then(|db| db.code())
        .is_some_and(|code| code == UNIQUE_VIOLATION);
    if unique_violation {
        anyhow::Error::new(PairConflict)
    } else {
        e
    }
}

#[async_trait]
impl SuggestionStore for PostgresSuggestionStore {
    async fn insert(&self, new: NewSuggestion) -> Result<Suggestion> {
        Suggestion::insert(new, &self.pool)
            .await
            .map_err(map_pair_conflict)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Suggestion>> {
        Suggestion::find_by_id(id, &self.pool).await
    }

    async fn find_active_for_pair(&self, a: Uuid, b: Uuid) -> Result<Option<Suggestion>> {
        Suggestion::find_active_for_pair(a, b, &self.pool).await
    }

    async fn record_transition(
        &self,
        id: Uuid,
        from: SuggestionStatus,
        to: SuggestionStatus,
        note: Option<String>,
    ) -> Result<Option<Suggestion>> {
        Suggestion::record_transition(id, from, to, note.as_deref(), &self.pool).await
    }

    async fn history(&self, suggestion_id: Uuid) -> Result<Vec<StatusHistoryEntry>> {
        StatusHistoryEntry::find_for_suggestion(suggestion_id, &self.pool).await
    }

    async fn find_deadline_passed(&self, now: DateTime<Utc>) -> Result<Vec<Suggestion>> {
        Suggestion::find_deadline_passed(now, &self.pool).await
    }

    async fn mark_viewed(&self, id: Uuid, party: Party, at: DateTime<Utc>) -> Result<()> {
        Suggestion::mark_viewed(id, party, at, &self.pool).await
    }
}
