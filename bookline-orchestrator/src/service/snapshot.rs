//! Bulk job snapshot loop
//!
//! Periodically writes a best-effort snapshot of aggregate job state. The
//! per-job row written on every transition remains the source of truth; the
//! snapshot may lag and a failed cycle only logs.

use std::sync::Arc;

use tokio::time::{self, MissedTickBehavior};

use crate::context::AppState;
use crate::store::StoreError;

/// Spawns the periodic snapshot task.
pub fn spawn_snapshot_loop(state: Arc<AppState>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let interval_period = state.config.snapshot_interval;
        tracing::info!("Starting job snapshot loop (interval: {:?})", interval_period);

        let mut interval = time::interval(interval_period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            interval.tick().await;

            if let Err(e) = snapshot_once(&state).await {
                tracing::warn!("Job snapshot cycle failed: {}", e);
            }
        }
    })
}

/// Performs a single snapshot cycle.
pub async fn snapshot_once(state: &AppState) -> Result<(), StoreError> {
    let jobs = state.jobs.list().await?;
    state.jobs.write_snapshot(&jobs).await?;
    tracing::debug!("Snapshot written for {} job(s)", jobs.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::testing::{TestHarness, sample_job};
    use bookline_core::domain::job::NotificationTarget;

    #[tokio::test]
    async fn test_snapshot_captures_all_jobs() {
        let h = TestHarness::new().build();
        for _ in 0..3 {
            let job = sample_job(NotificationTarget::CreatorOnly);
            h.state.jobs.upsert(&job).await.unwrap();
        }

        snapshot_once(&h.state).await.unwrap();

        let snapshot = h.store.last_snapshot().await.unwrap();
        assert_eq!(snapshot.as_array().unwrap().len(), 3);
    }
}
