//! Shared test harness: ServerDeps wired against the in-memory stores, with
//! handles kept so tests can inspect and manipulate state directly.

// Each test binary uses a different subset of the harness.
#![allow(dead_code)]

use std::sync::Arc;

use server_core::common::{Actor, Role};
use server_core::kernel::test_dependencies::{
    InMemoryMatchingStore, InMemorySuggestionStore, RecordingDispatcher, StaticVectorProvider,
};
use server_core::kernel::{MatchingConfig, ServerDeps};
use uuid::Uuid;

pub struct TestHarness {
    pub deps: Arc<ServerDeps>,
    pub suggestions: Arc<InMemorySuggestionStore>,
    pub matching: Arc<InMemoryMatchingStore>,
    pub dispatcher: Arc<RecordingDispatcher>,
}

impl TestHarness {
    pub fn new() -> Self {
        Self::build(StaticVectorProvider::new(), RecordingDispatcher::new())
    }

    pub fn with_vectors(vectors: StaticVectorProvider) -> Self {
        Self::build(vectors, RecordingDispatcher::new())
    }

    pub fn with_failing_dispatcher() -> Self {
        Self::build(StaticVectorProvider::new(), RecordingDispatcher::failing())
    }

    fn build(vectors: StaticVectorProvider, dispatcher: RecordingDispatcher) -> Self {
        let suggestions = Arc::new(InMemorySuggestionStore::new());
        let matching = Arc::new(InMemoryMatchingStore::new());
        let dispatcher = Arc::new(dispatcher);

        let deps = Arc::new(ServerDeps {
            suggestions: suggestions.clone(),
            matching: matching.clone(),
            vectors: Arc::new(vectors),
            notifier: dispatcher.clone(),
            matching_config: MatchingConfig::default(),
        });

        Self {
            deps,
            suggestions,
            matching,
            dispatcher,
        }
    }
}

pub fn matchmaker() -> Actor {
    Actor::new(Uuid::new_v4(), Role::Matchmaker)
}

pub fn admin() -> Actor {
    Actor::new(Uuid::new_v4(), Role::Admin)
}

pub fn party(id: Uuid) -> Actor {
    Actor::new(id, Role::Party)
}
