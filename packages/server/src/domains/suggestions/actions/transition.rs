//! The transition action: the only write path for suggestion status.

use anyhow::anyhow;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::common::{Actor, Role};
use crate::domains::suggestions::errors::SuggestionError;
use crate::domains::suggestions::events::SuggestionEvent;
use crate::domains::suggestions::machines::SuggestionStatus;
use crate::domains::suggestions::models::{Party, Suggestion};
use crate::kernel::ServerDeps;

/// How many times a caller that loses a concurrent-write race re-reads and
/// re-validates before giving up.
const MAX_CAS_ATTEMPTS: usize = 3;

/// Drive a suggestion to `requested`, applying any mandated cascade.
///
/// The write is a compare-and-swap against the status the caller validated;
/// losing the race means re-reading current state and re-validating, never
/// blindly overwriting. On success the primary transition and its cascade
/// have both committed, each with its own history row and domain event.
#[instrument(skip(deps, note), fields(suggestion_id = %suggestion_id, requested = %requested))]
pub async fn transition_suggestion(
    suggestion_id: Uuid,
    requested: SuggestionStatus,
    note: Option<String>,
    actor: &Actor,
    deps: &ServerDeps,
) -> Result<Suggestion, SuggestionError> {
    let mut attempts = 0;
    loop {
        let current = deps
            .suggestions
            .find_by_id(suggestion_id)
            .await?
            .ok_or(SuggestionError::NotFound(suggestion_id))?;

        authorize(&current, actor, requested)?;

        if !current.status.can_transition_to(requested) {
            return Err(SuggestionError::InvalidTransition {
                from: current.status,
                to: requested,
            });
        }

        let Some(updated) = deps
            .suggestions
            .record_transition(suggestion_id, current.status, requested, note.clone())
            .await?
        else {
            attempts += 1;
            if attempts >= MAX_CAS_ATTEMPTS {
                return Err(SuggestionError::Storage(anyhow!(
                    "suggestion {suggestion_id} kept changing during transition"
                )));
            }
            warn!(attempts, "lost transition race, re-validating against current state");
            continue;
        };

        info!(from = %current.status, to = %requested, "suggestion transitioned");
        dispatch_event(deps, current.status, requested, note.clone(), suggestion_id).await;

        let mut latest = updated;
        if let Some(next) = requested.cascade() {
            // The cascade belongs to the same logical operation: a party
            // approval must never be observable as a resting state.
            if let Some(cascaded) = deps
                .suggestions
                .record_transition(suggestion_id, requested, next, None)
                .await?
            {
                info!(from = %requested, to = %next, "cascade applied");
                dispatch_event(deps, requested, next, None, suggestion_id).await;
                latest = cascaded;
            } else {
                warn!(from = %requested, to = %next, "cascade lost a race; leaving current state");
            }
        }

        return Ok(latest);
    }
}

/// Standing check: parties and the owning matchmaker may act; administrators
/// override. `Cancelled` is admin-only and `Expired` is reserved for the
/// deadline sweep. Party decisions may only come from that party (or the
/// matchmaker relaying them).
fn authorize(
    suggestion: &Suggestion,
    actor: &Actor,
    requested: SuggestionStatus,
) -> Result<(), SuggestionError> {
    if actor.is_privileged() {
        return Ok(());
    }

    if matches!(
        requested,
        SuggestionStatus::Cancelled | SuggestionStatus::Expired
    ) {
        return Err(SuggestionError::Unauthorized);
    }

    if !suggestion.involves(actor.id) {
        return Err(SuggestionError::Unauthorized);
    }

    let is_matchmaker =
        actor.id == suggestion.matchmaker_id && matches!(actor.role, Role::Matchmaker);
    match requested {
        SuggestionStatus::FirstPartyApproved | SuggestionStatus::FirstPartyDeclined
            if !is_matchmaker && suggestion.party_of(actor.id) != Some(Party::First) =>
        {
            Err(SuggestionError::Unauthorized)
        }
        SuggestionStatus::SecondPartyApproved | SuggestionStatus::SecondPartyDeclined
            if !is_matchmaker && suggestion.party_of(actor.id) != Some(Party::Second) =>
        {
            Err(SuggestionError::Unauthorized)
        }
        _ => Ok(()),
    }
}

/// Fire-and-forget dispatch. The transition has already committed; a
/// delivery failure is logged and swallowed.
async fn dispatch_event(
    deps: &ServerDeps,
    from_status: SuggestionStatus,
    to_status: SuggestionStatus,
    note: Option<String>,
    suggestion_id: Uuid,
) {
    let event = SuggestionEvent::StatusChanged {
        suggestion_id,
        from_status,
        to_status,
        note,
    };
    if let Err(e) = deps.notifier.dispatch(event).await {
        warn!(error = %e, "notification dispatch failed; transition stands");
    }
}
