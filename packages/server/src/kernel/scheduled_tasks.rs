//! Scheduled background tasks using tokio-cron-scheduler.
//!
//! Two periodic sweeps keep the system from wedging:
//! - matching jobs stuck in pending or processing past the configured
//!   timeout are reclassified failed with error `Timeout`;
//! - suggestions whose response/decision deadline passed are expired via
//!   the ordinary transition path.

use std::sync::Arc;

use anyhow::Result;
use chrono::Utc;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info};

use crate::domains::suggestions::actions::sweep_expired_suggestions;
use crate::kernel::ServerDeps;

/// Start all scheduled tasks. Both sweeps run every minute.
pub async fn start_scheduler(deps: Arc<ServerDeps>) -> Result<JobScheduler> {
    let scheduler = JobScheduler::new().await?;

    let timeout_deps = Arc::clone(&deps);
    let timeout_job = Job::new_async("0 * * * * *", move |_uuid, _lock| {
        let deps = Arc::clone(&timeout_deps);
        Box::pin(async move {
            if let Err(e) = run_job_timeout_sweep(&deps).await {
                error!(error = %e, "job timeout sweep failed");
            }
        })
    })?;
    scheduler.add(timeout_job).await?;

    let expiry_deps = Arc::clone(&deps);
    let expiry_job = Job::new_async("30 * * * * *", move |_uuid, _lock| {
        let deps = Arc::clone(&expiry_deps);
        Box::pin(async move {
            if let Err(e) = sweep_expired_suggestions(&deps).await {
                error!(error = %e, "suggestion expiry sweep failed");
            }
        })
    })?;
    scheduler.add(expiry_job).await?;

    scheduler.start().await?;
    info!("scheduled tasks started (job timeout + suggestion expiry sweeps, every minute)");
    Ok(scheduler)
}

/// Fail every matching job stuck in pending or processing longer than the
/// configured timeout. Returns how many jobs were swept.
pub async fn run_job_timeout_sweep(deps: &ServerDeps) -> Result<usize> {
    let cutoff = Utc::now() - deps.matching_config.job_timeout;
    let swept = deps.matching.sweep_timed_out(cutoff).await?;
    if !swept.is_empty() {
        info!(count = swept.len(), "swept timed-out matching jobs");
    }
    Ok(swept.len())
}
