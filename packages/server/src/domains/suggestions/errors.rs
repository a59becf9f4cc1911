use thiserror::Error;
use uuid::Uuid;

use crate::domains::suggestions::machines::SuggestionStatus;

/// Errors surfaced by suggestion actions.
///
/// `InvalidTransition` and `Unauthorized` are actor errors and are never
/// retried; both leave the suggestion untouched.
#[derive(Error, Debug)]
pub enum SuggestionError {
    #[error("invalid transition from {from} to {to}")]
    InvalidTransition {
        from: SuggestionStatus,
        to: SuggestionStatus,
    },

    #[error("actor has no standing on this suggestion")]
    Unauthorized,

    #[error("suggestion {0} not found")]
    NotFound(Uuid),

    #[error("first and second party must be different people")]
    SameParty,

    #[error("an active suggestion already exists for this pair")]
    DuplicatePair,

    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}
