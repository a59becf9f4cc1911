pub mod actions;
pub mod errors;
pub mod jobs;
pub mod models;
pub mod store;
pub mod utils;

pub use errors::MatchingError;
pub use store::{MatchingStore, PostgresMatchingStore};
