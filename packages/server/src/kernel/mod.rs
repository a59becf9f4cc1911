pub mod deps;
pub mod scheduled_tasks;
pub mod test_dependencies;
pub mod traits;

pub use deps::{MatchingConfig, ServerDeps};
pub use scheduled_tasks::{run_job_timeout_sweep, start_scheduler};
pub use traits::{
    BaseNotificationDispatcher, BaseVectorProvider, LoggingNotificationDispatcher,
    PgVectorProvider, VectorLookup,
};
