// HTTP routes
pub mod health;
pub mod matching;
pub mod suggestions;

pub use health::*;
pub use matching::*;
pub use suggestions::*;

use axum::{http::StatusCode, Json};
use serde::Serialize;

use crate::domains::matching::errors::MatchingError;
use crate::domains::suggestions::errors::SuggestionError;

#[derive(Serialize)]
pub struct ErrorBody {
    pub error: String,
}

pub type ApiError = (StatusCode, Json<ErrorBody>);

fn error_response(status: StatusCode, error: impl std::fmt::Display) -> ApiError {
    (
        status,
        Json(ErrorBody {
            error: error.to_string(),
        }),
    )
}

pub fn suggestion_error(e: SuggestionError) -> ApiError {
    let status = match &e {
        SuggestionError::InvalidTransition { .. } | SuggestionError::DuplicatePair => {
            StatusCode::CONFLICT
        }
        SuggestionError::Unauthorized => StatusCode::FORBIDDEN,
        SuggestionError::NotFound(_) => StatusCode::NOT_FOUND,
        SuggestionError::SameParty => StatusCode::UNPROCESSABLE_ENTITY,
        SuggestionError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status == StatusCode::INTERNAL_SERVER_ERROR {
        tracing::error!(error = %e, "suggestion request failed");
        return error_response(status, "internal server error");
    }
    error_response(status, e)
}

pub fn matching_error(e: MatchingError) -> ApiError {
    let status = match &e {
        MatchingError::JobNotFound(_) => StatusCode::NOT_FOUND,
        MatchingError::Unauthorized => StatusCode::FORBIDDEN,
        MatchingError::EmptyCandidatePool
        | MatchingError::TargetInPool
        | MatchingError::MissingEmbedding(_)
        | MatchingError::EmbeddingPending(_) => StatusCode::UNPROCESSABLE_ENTITY,
        MatchingError::Timeout | MatchingError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status == StatusCode::INTERNAL_SERVER_ERROR {
        tracing::error!(error = %e, "matching request failed");
        return error_response(status, "internal server error");
    }
    error_response(status, e)
}
