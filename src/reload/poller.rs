//! Fixed-interval polling of a snapshot source.

use crate::error::ConfigError;
use crate::reload::{Reloader, SnapshotSource};
use std::time::Duration;
use tokio::time::MissedTickBehavior;

pub struct ConfigPoller<S> {
    source: S,
    reloader: Reloader,
    interval: Duration,
}

impl<S: SnapshotSource> ConfigPoller<S> {
    pub fn new(source: S, reloader: Reloader, interval: Duration) -> Self {
        ConfigPoller {
            source,
            reloader,
            interval,
        }
    }

    /// One refresh. On failure the published routes stay as they are.
    pub async fn poll_once(&self) -> Result<u64, ConfigError> {
        match self.source.fetch().await {
            Ok(snapshot) => Ok(self.reloader.apply(snapshot)),
            Err(e) => {
                tracing::warn!(error = %e, "config refresh failed, keeping current routes");
                Err(e)
            }
        }
    }

    /// Poll forever. The first refresh happens immediately.
    pub async fn run(self) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tracing::info!(interval_secs = self.interval.as_secs(), "config poller started");
        loop {
            ticker.tick().await;
            let _ = self.poll_once().await;
        }
    }
}
