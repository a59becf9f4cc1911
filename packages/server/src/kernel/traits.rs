// Trait definitions for dependency injection
//
// These are INFRASTRUCTURE traits only - no business logic. The lifecycle
// and matching rules live in their domains and use these seams to reach
// external collaborators.

use anyhow::Result;
use async_trait::async_trait;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::domains::matching::models::ProfileVector;
use crate::domains::suggestions::events::SuggestionEvent;

// =============================================================================
// Vector Provider (Infrastructure - embedding read side)
// =============================================================================

/// Outcome of an embedding lookup. `Pending` means generation has been
/// queued but not landed yet; callers must treat it differently from
/// `NotFound`.
#[derive(Debug, Clone, PartialEq)]
pub enum VectorLookup {
    Ready(Vec<f32>),
    Pending,
    NotFound,
}

#[async_trait]
pub trait BaseVectorProvider: Send + Sync {
    async fn get_vector(&self, profile_id: Uuid) -> Result<VectorLookup>;

    /// Bulk lookup; profiles without a ready embedding are absent from the
    /// result.
    async fn get_vectors(&self, profile_ids: &[Uuid]) -> Result<Vec<ProfileVector>>;
}

/// Reads embeddings from the `profile_vectors` table.
pub struct PgVectorProvider {
    pool: PgPool,
}

impl PgVectorProvider {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BaseVectorProvider for PgVectorProvider {
    async fn get_vector(&self, profile_id: Uuid) -> Result<VectorLookup> {
        ProfileVector::find(profile_id, &self.pool).await
    }

    async fn get_vectors(&self, profile_ids: &[Uuid]) -> Result<Vec<ProfileVector>> {
        ProfileVector::find_many(profile_ids, &self.pool).await
    }
}

// =============================================================================
// Notification Dispatcher (Infrastructure - outbound domain events)
// =============================================================================

#[async_trait]
pub trait BaseNotificationDispatcher: Send + Sync {
    /// Deliver one domain event. Callers treat this as fire-and-forget:
    /// a returned error is logged, never propagated into the transition.
    async fn dispatch(&self, event: SuggestionEvent) -> Result<()>;
}

/// Default dispatcher: logs events. Message delivery (email/WhatsApp) is an
/// external collaborator wired in at deployment.
pub struct LoggingNotificationDispatcher;

#[async_trait]
impl BaseNotificationDispatcher for LoggingNotificationDispatcher {
    async fn dispatch(&self, event: SuggestionEvent) -> Result<()> {
        let SuggestionEvent::StatusChanged {
            suggestion_id,
            from_status,
            to_status,
            ..
        } = &event;
        info!(%suggestion_id, %from_status, %to_status, "suggestion event dispatched");
        Ok(())
    }
}
