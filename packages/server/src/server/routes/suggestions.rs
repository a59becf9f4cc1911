//! Suggestion lifecycle endpoints.

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::common::Actor;
use crate::domains::suggestions::actions::{
    create_suggestion, get_suggestion, transition_suggestion, CreateSuggestionRequest,
    SuggestionView,
};
use crate::domains::suggestions::machines::SuggestionStatus;
use crate::domains::suggestions::models::Suggestion;
use crate::server::app::AxumAppState;
use crate::server::routes::{suggestion_error, ApiError};

pub async fn create_suggestion_handler(
    Extension(state): Extension<AxumAppState>,
    actor: Actor,
    Json(req): Json<CreateSuggestionRequest>,
) -> Result<(StatusCode, Json<Suggestion>), ApiError> {
    let suggestion = create_suggestion(req, &actor, &state.deps)
        .await
        .map_err(suggestion_error)?;
    Ok((StatusCode::CREATED, Json(suggestion)))
}

pub async fn get_suggestion_handler(
    Extension(state): Extension<AxumAppState>,
    actor: Actor,
    Path(suggestion_id): Path<Uuid>,
) -> Result<Json<SuggestionView>, ApiError> {
    let view = get_suggestion(suggestion_id, &actor, &state.deps)
        .await
        .map_err(suggestion_error)?;
    Ok(Json(view))
}

#[derive(Debug, Deserialize)]
pub struct TransitionRequest {
    pub status: SuggestionStatus,
    pub note: Option<String>,
}

pub async fn transition_suggestion_handler(
    Extension(state): Extension<AxumAppState>,
    actor: Actor,
    Path(suggestion_id): Path<Uuid>,
    Json(req): Json<TransitionRequest>,
) -> Result<Json<Suggestion>, ApiError> {
    let suggestion = transition_suggestion(suggestion_id, req.status, req.note, &actor, &state.deps)
        .await
        .map_err(suggestion_error)?;
    Ok(Json(suggestion))
}
