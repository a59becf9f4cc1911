//! Server dependencies for actions (using traits for testability)
//!
//! The central dependency container handed to every action. Storage and
//! external services are trait objects so tests can swap in the in-memory
//! implementations from `test_dependencies`. Built once at bootstrap; no
//! ambient singletons.

use std::sync::Arc;

use chrono::Duration;
use sqlx::PgPool;

use crate::domains::matching::store::{MatchingStore, PostgresMatchingStore};
use crate::domains::matching::utils::scoring::TOP_N_RESULTS;
use crate::domains::suggestions::store::{PostgresSuggestionStore, SuggestionStore};
use crate::kernel::traits::{
    BaseNotificationDispatcher, BaseVectorProvider, LoggingNotificationDispatcher,
    PgVectorProvider,
};

/// Tunables for the matching pipeline.
#[derive(Debug, Clone, Copy)]
pub struct MatchingConfig {
    /// Jobs processing longer than this are swept to failed.
    pub job_timeout: Duration,
    /// Result-set cap per search.
    pub top_n: usize,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            job_timeout: Duration::minutes(10),
            top_n: TOP_N_RESULTS,
        }
    }
}

/// Dependencies accessible to actions.
#[derive(Clone)]
pub struct ServerDeps {
    pub suggestions: Arc<dyn SuggestionStore>,
    pub matching: Arc<dyn MatchingStore>,
    pub vectors: Arc<dyn BaseVectorProvider>,
    pub notifier: Arc<dyn BaseNotificationDispatcher>,
    pub matching_config: MatchingConfig,
}

impl ServerDeps {
    /// Production wiring: Postgres-backed stores and the logging dispatcher.
    pub fn postgres(pool: PgPool, matching_config: MatchingConfig) -> Self {
        Self {
            suggestions: Arc::new(PostgresSuggestionStore::new(pool.clone())),
            matching: Arc::new(PostgresMatchingStore::new(pool.clone())),
            vectors: Arc::new(PgVectorProvider::new(pool)),
            notifier: Arc::new(LoggingNotificationDispatcher),
            matching_config,
        }
    }
}
