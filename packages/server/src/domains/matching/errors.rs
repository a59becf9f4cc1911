use thiserror::Error;
use uuid::Uuid;

/// Errors surfaced by the matching pipeline.
///
/// Worker-side failures are captured into the job's `error_message` via
/// `Display` and surfaced only through polling; a retry is a fresh submit,
/// never an automatic background retry.
#[derive(Error, Debug)]
pub enum MatchingError {
    #[error("matching job {0} not found")]
    JobNotFound(Uuid),

    #[error("matchmaker or administrator role required")]
    Unauthorized,

    #[error("candidate pool must not be empty")]
    EmptyCandidatePool,

    #[error("target person cannot appear in the candidate pool")]
    TargetInPool,

    #[error("target profile {0} has no embedding")]
    MissingEmbedding(Uuid),

    #[error("target profile {0} embedding is not ready yet")]
    EmbeddingPending(Uuid),

    #[error("Timeout")]
    Timeout,

    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}
