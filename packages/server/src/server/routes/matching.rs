//! Matching pipeline endpoints: submit returns 202 immediately; clients
//! poll the status endpoint for progress and results.

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::common::Actor;
use crate::domains::matching::actions::{
    get_job_status, submit_matching_job, JobStatusResponse, SubmitOutcome,
};
use crate::server::app::AxumAppState;
use crate::server::routes::{matching_error, ApiError};

#[derive(Debug, Deserialize)]
pub struct SubmitJobRequest {
    pub target_user_id: Uuid,
    pub candidate_pool_ids: Vec<Uuid>,
}

pub async fn submit_job_handler(
    Extension(state): Extension<AxumAppState>,
    actor: Actor,
    Json(req): Json<SubmitJobRequest>,
) -> Result<(StatusCode, Json<SubmitOutcome>), ApiError> {
    let outcome =
        submit_matching_job(req.target_user_id, req.candidate_pool_ids, &actor, &state.deps)
            .await
            .map_err(matching_error)?;
    Ok((StatusCode::ACCEPTED, Json(outcome)))
}

pub async fn job_status_handler(
    Extension(state): Extension<AxumAppState>,
    _actor: Actor,
    Path(job_id): Path<Uuid>,
) -> Result<Json<JobStatusResponse>, ApiError> {
    let status = get_job_status(job_id, &state.deps)
        .await
        .map_err(matching_error)?;
    Ok(Json(status))
}
