//! Schedules sync runs.

use std::sync::Arc;
use std::time::Duration;

use log::error;
use log::info;
use tokio::time::MissedTickBehavior;

use crate::service::error::SyncError;
use crate::service::sync_service::SyncReport;
use crate::service::sync_service::SyncService;

/// Runs the sync service once or on a fixed interval.
///
/// Runs never overlap within one process: each run is awaited before the
/// next tick is taken.
pub struct SyncTask {
    service: Arc<SyncService>,
    poll_interval: Duration,
}

impl SyncTask {
    pub fn new(service: Arc<SyncService>, poll_interval: Duration) -> Self {
        Self {
            service,
            poll_interval,
        }
    }

    pub async fn run_once(&self) -> Result<SyncReport, SyncError> {
        self.service.run_once().await
    }

    /// Polls until `shutdown` resolves. Failed runs are logged and retried on
    /// the next tick.
    pub async fn run_until<F>(&self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        info!(
            "Starting sync loop with poll interval {:?}",
            self.poll_interval
        );
        let mut interval = tokio::time::interval(self.poll_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Stopping sync loop.");
                    break;
                }
                _ = interval.tick() => {
                    if let Err(e) = self.service.run_once().await {
                        error!("Sync run failed, checkpoint left unchanged: {e}");
                    }
                }
            }
        }
    }
}
