//! Read-side projection of a suggestion for a given viewer.

use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

use crate::common::Actor;
use crate::domains::suggestions::errors::SuggestionError;
use crate::domains::suggestions::models::{Party, StatusHistoryEntry, Suggestion};
use crate::kernel::ServerDeps;

/// What a viewer gets back when fetching a suggestion.
///
/// `contact_details_visible` is derived from the current status on every
/// read; the state machine is the sole gate for disclosure. Party-scoped
/// notes are filtered to the viewer's side and the internal note is only
/// shown to the matchmaker or an administrator.
#[derive(Debug, Serialize)]
pub struct SuggestionView {
    #[serde(flatten)]
    pub suggestion: Suggestion,
    pub contact_details_visible: bool,
    pub history: Vec<StatusHistoryEntry>,
}

/// Fetch a suggestion as `actor`, stamping the per-party read marker when
/// the viewer is one of the parties.
pub async fn get_suggestion(
    suggestion_id: Uuid,
    actor: &Actor,
    deps: &ServerDeps,
) -> Result<SuggestionView, SuggestionError> {
    let mut suggestion = deps
        .suggestions
        .find_by_id(suggestion_id)
        .await?
        .ok_or(SuggestionError::NotFound(suggestion_id))?;

    if !actor.is_privileged() && !suggestion.involves(actor.id) {
        return Err(SuggestionError::Unauthorized);
    }

    if let Some(party) = suggestion.party_of(actor.id) {
        let now = Utc::now();
        deps.suggestions.mark_viewed(suggestion_id, party, now).await?;
        match party {
            Party::First => suggestion.first_party_last_viewed_at = Some(now),
            Party::Second => suggestion.second_party_last_viewed_at = Some(now),
        }
    }

    redact_for_viewer(&mut suggestion, actor);

    let history = deps.suggestions.history(suggestion_id).await?;
    let contact_details_visible = suggestion.status.contact_details_visible();

    Ok(SuggestionView {
        suggestion,
        contact_details_visible,
        history,
    })
}

fn redact_for_viewer(suggestion: &mut Suggestion, actor: &Actor) {
    if actor.is_privileged() || actor.id == suggestion.matchmaker_id {
        return;
    }
    suggestion.internal_note = None;
    match suggestion.party_of(actor.id) {
        Some(Party::First) => suggestion.note_for_second_party = None,
        Some(Party::Second) => suggestion.note_for_first_party = None,
        None => {
            suggestion.note_for_first_party = None;
            suggestion.note_for_second_party = None;
        }
    }
}
