pub mod job_status;
pub mod submit_job;

pub use job_status::{get_job_status, CompletedResults, JobStatusResponse};
pub use submit_job::{submit_matching_job, SubmitOutcome};
