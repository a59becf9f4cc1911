use serde::Serialize;
use uuid::Uuid;

use crate::domains::suggestions::machines::SuggestionStatus;

/// Suggestion domain events, consumed by the notification dispatcher.
///
/// Dispatch is fire-and-forget: a delivery failure is logged and never rolls
/// back the transition that produced the event.
#[derive(Debug, Clone, Serialize)]
pub enum SuggestionEvent {
    StatusChanged {
        suggestion_id: Uuid,
        from_status: SuggestionStatus,
        to_status: SuggestionStatus,
        note: Option<String>,
    },
}
