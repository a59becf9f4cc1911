//! Deadline sweep: moves overdue suggestions to `Expired`.
//!
//! The sweep is just another caller of the transition action, so expiry
//! produces the same history rows and events as any other status change.

use anyhow::Result;
use tracing::{info, instrument, warn};

use crate::common::Actor;
use crate::domains::suggestions::actions::transition_suggestion;
use crate::domains::suggestions::errors::SuggestionError;
use crate::domains::suggestions::machines::SuggestionStatus;
use crate::kernel::ServerDeps;

/// Expire every non-terminal suggestion whose response or decision deadline
/// has passed. Returns how many were expired.
#[instrument(skip(deps))]
pub async fn sweep_expired_suggestions(deps: &ServerDeps) -> Result<usize> {
    let due = deps
        .suggestions
        .find_deadline_passed(chrono::Utc::now())
        .await?;
    if due.is_empty() {
        return Ok(0);
    }

    let actor = Actor::system();
    let mut expired = 0;
    for suggestion in due {
        match transition_suggestion(
            suggestion.id,
            SuggestionStatus::Expired,
            Some("deadline passed".to_string()),
            &actor,
            deps,
        )
        .await
        {
            Ok(_) => expired += 1,
            // Raced into a terminal state since the query ran; nothing to do.
            Err(SuggestionError::InvalidTransition { .. }) => {}
            Err(e) => warn!(suggestion_id = %suggestion.id, error = %e, "expiry failed"),
        }
    }

    info!(expired, "expiry sweep complete");
    Ok(expired)
}
