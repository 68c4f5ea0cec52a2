use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Notify;
use tracing::{info, warn};

use crate::services::monitor::MonitorService;

/// Drives the monitor on a fixed cadence for the lifetime of the process.
///
/// The sleep comes first, so the effective period is one pass plus the
/// interval rather than a strict fixed rate.
pub struct MonitorScheduler {
    service: MonitorService,
    interval: Duration,
    shutdown: Arc<Notify>,
}

impl MonitorScheduler {
    pub fn new(service: MonitorService, interval_secs: u64, shutdown: Arc<Notify>) -> Self {
        Self {
            service,
            interval: Duration::from_secs(interval_secs),
            shutdown,
        }
    }

    pub async fn start(self) {
        info!("starting course monitor (interval: {:?})", self.interval);

        loop {
            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {}
                _ = self.shutdown.notified() => {
                    info!("course monitor stopping");
                    return;
                }
            }

            match self.service.run_cycle().await {
                Ok(stats) => {
                    info!(
                        "monitor cycle completed - checked: {}, transitions: {}, fanouts: {}, fetch failures: {}",
                        stats.checked, stats.transitions, stats.fanouts, stats.fetch_failures
                    );
                }
                Err(e) => {
                    // One bad cycle must not kill the monitor.
                    warn!("monitor cycle failed: {e:?}");
                }
            }
        }
    }
}
