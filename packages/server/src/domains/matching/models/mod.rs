pub mod matching_job;
pub mod profile_vector;
pub mod saved_match_search;

pub use matching_job::{MatchingJob, MatchingJobStatus};
pub use profile_vector::ProfileVector;
pub use saved_match_search::{MatchResult, SavedMatchSearch, ALGORITHM_VERSION};
