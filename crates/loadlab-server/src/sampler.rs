//! Background catalog sampler.
//!
//! A single task refreshes `db_size_bytes` on a fixed interval, independent
//! of request traffic. Each cycle is one bounded query; a failed or timed-out
//! cycle is skipped and the gauge keeps its last good value until a later
//! cycle succeeds. There is no retry within a cycle.

use std::sync::Arc;
use std::time::{Duration, SystemTime};

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use crate::app_state::AppState;
use crate::obs::ServiceMetrics;
use crate::store::{self, CatalogStore};

/// Result of one successful cycle. Only the gauge outlives it.
#[derive(Debug, Clone, Copy)]
pub struct BackgroundSample {
    pub db_size_bytes: i64,
    pub taken_at: SystemTime,
}

pub struct Sampler {
    store: Arc<dyn CatalogStore>,
    metrics: ServiceMetrics,
    interval: Duration,
    query_timeout: Duration,
}

impl Sampler {
    pub fn new(
        store: Arc<dyn CatalogStore>,
        metrics: ServiceMetrics,
        interval: Duration,
        query_timeout: Duration,
    ) -> Self {
        Self { store, metrics, interval, query_timeout }
    }

    pub fn from_state(state: &AppState) -> Self {
        let cfg = &state.cfg().sampler;
        Self::new(state.store(), state.metrics().clone(), cfg.interval(), cfg.query_timeout())
    }

    /// Run one cycle. Returns the sample when the gauge was updated.
    pub async fn sample_once(&self) -> Option<BackgroundSample> {
        let query = self.store.total_size_bytes();
        match store::within(self.query_timeout, "database size", query).await {
            Ok(size) => {
                self.metrics.db_size_bytes.set(&[], size as f64);
                Some(BackgroundSample { db_size_bytes: size, taken_at: SystemTime::now() })
            }
            Err(e) => {
                tracing::debug!(error = %e, "sampler: cycle skipped");
                None
            }
        }
    }

    /// Start the periodic loop. The first cycle runs one interval after start.
    /// Abort the handle to stop it.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            let first = Instant::now() + self.interval;
            let mut ticker = tokio::time::interval_at(first, self.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            tracing::info!(interval_ms = self.interval.as_millis() as u64, "sampler started");
            loop {
                ticker.tick().await;
                self.sample_once().await;
            }
        })
    }
}
