//! Draft a new suggestion for a pair of candidates.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::common::Actor;
use crate::domains::suggestions::errors::SuggestionError;
use crate::domains::suggestions::models::{NewSuggestion, Suggestion};
use crate::domains::suggestions::store::PairConflict;
use crate::kernel::ServerDeps;

#[derive(Debug, Clone, Deserialize)]
pub struct CreateSuggestionRequest {
    pub first_party_id: Uuid,
    pub second_party_id: Uuid,
    /// Defaults to the calling matchmaker; administrators may draft on
    /// another matchmaker's behalf.
    pub matchmaker_id: Option<Uuid>,
    #[serde(default)]
    pub priority: i32,
    pub internal_note: Option<String>,
    pub note_for_first_party: Option<String>,
    pub note_for_second_party: Option<String>,
    pub decision_deadline: Option<DateTime<Utc>>,
    pub response_deadline: Option<DateTime<Utc>>,
}

/// Create a suggestion in `Draft`.
///
/// Rejects a pair that already has an active suggestion in either party
/// order. The database enforces the same invariant with a partial unique
/// index; a duplicate that commits between the pre-check and the insert is
/// caught there and reported exactly like the pre-checked path.
pub async fn create_suggestion(
    req: CreateSuggestionRequest,
    actor: &Actor,
    deps: &ServerDeps,
) -> Result<Suggestion, SuggestionError> {
    if !actor.is_matchmaker() && !actor.is_privileged() {
        return Err(SuggestionError::Unauthorized);
    }

    if req.first_party_id == req.second_party_id {
        return Err(SuggestionError::SameParty);
    }

    if deps
        .suggestions
        .find_active_for_pair(req.first_party_id, req.second_party_id)
        .await?
        .is_some()
    {
        return Err(SuggestionError::DuplicatePair);
    }

    let matchmaker_id = match req.matchmaker_id {
        Some(id) if actor.is_privileged() => id,
        _ => actor.id,
    };

    let mut new = NewSuggestion::builder()
        .first_party_id(req.first_party_id)
        .second_party_id(req.second_party_id)
        .matchmaker_id(matchmaker_id)
        .priority(req.priority)
        .build();
    new.internal_note = req.internal_note;
    new.note_for_first_party = req.note_for_first_party;
    new.note_for_second_party = req.note_for_second_party;
    new.decision_deadline = req.decision_deadline;
    new.response_deadline = req.response_deadline;

    let suggestion = deps.suggestions.insert(new).await.map_err(|e| {
        if e.downcast_ref::<PairConflict>().is_some() {
            SuggestionError::DuplicatePair
        } else {
            SuggestionError::Storage(e)
        }
    })?;
    info!(
        suggestion_id = %suggestion.id,
        first_party = %suggestion.first_party_id,
        second_party = %suggestion.second_party_id,
        "suggestion drafted"
    );
    Ok(suggestion)
}
