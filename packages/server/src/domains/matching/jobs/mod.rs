//! Background execution of matching jobs.
//!
//! Each submitted job runs on its own spawned task so the submitting
//! request returns immediately. The single-flight guard in the store keeps
//! at most one non-terminal job per target, so no two workers ever write
//! the same cache key concurrently.

pub mod runner;

pub use runner::{run_matching_job, spawn_matching_job};
