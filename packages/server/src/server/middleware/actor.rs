//! Actor extraction from gateway-forwarded identity headers.
//!
//! The auth gateway terminates sessions and forwards the caller's identity
//! as `x-actor-id` and `x-actor-role`. Handlers take [`Actor`] as an
//! extractor; requests without a valid identity are rejected with 401.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
    Json,
};
use serde_json::json;
use uuid::Uuid;

use crate::common::{Actor, Role};

pub const ACTOR_ID_HEADER: &str = "x-actor-id";
pub const ACTOR_ROLE_HEADER: &str = "x-actor-role";

#[async_trait]
impl<S> FromRequestParts<S> for Actor
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, Json<serde_json::Value>);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let id = parts
            .headers
            .get(ACTOR_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| Uuid::parse_str(v).ok());

        let role = parts
            .headers
            .get(ACTOR_ROLE_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(Role::parse);

        match (id, role) {
            (Some(id), Some(role)) => Ok(Actor::new(id, role)),
            _ => Err((
                StatusCode::UNAUTHORIZED,
                Json(json!({ "error": "authentication required" })),
            )),
        }
    }
}
