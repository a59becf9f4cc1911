//! Application setup and server configuration.

use std::sync::Arc;

use axum::{
    extract::Extension,
    http::{header::CONTENT_TYPE, HeaderName, Method},
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::kernel::ServerDeps;
use crate::server::middleware::{ACTOR_ID_HEADER, ACTOR_ROLE_HEADER};
use crate::server::routes::{
    create_suggestion_handler, get_suggestion_handler, health_handler, job_status_handler,
    submit_job_handler, transition_suggestion_handler,
};

/// Shared application state
#[derive(Clone)]
pub struct AxumAppState {
    pub deps: Arc<ServerDeps>,
}

/// Build the Axum application router
pub fn build_app(deps: Arc<ServerDeps>) -> Router {
    let app_state = AxumAppState { deps };

    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([
            CONTENT_TYPE,
            HeaderName::from_static(ACTOR_ID_HEADER),
            HeaderName::from_static(ACTOR_ROLE_HEADER),
        ]);

    Router::new()
        .route("/health", get(health_handler))
        .route("/api/suggestions", post(create_suggestion_handler))
        .route("/api/suggestions/:suggestion_id", get(get_suggestion_handler))
        .route(
            "/api/suggestions/:suggestion_id/transition",
            post(transition_suggestion_handler),
        )
        .route("/api/matching/jobs", post(submit_job_handler))
        .route("/api/matching/jobs/:job_id", get(job_status_handler))
        .layer(Extension(app_state))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
