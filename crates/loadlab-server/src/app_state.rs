//! Shared application state.
//!
//! One [`Registry`] per state; the metric families are registered here, once,
//! before any handler or the sampler can write to them.

use std::sync::Arc;

use loadlab_core::error::Result;

use crate::config::ServiceConfig;
use crate::obs::{Registry, ServiceMetrics};
use crate::store::CatalogStore;

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    cfg: ServiceConfig,
    registry: Registry,
    metrics: ServiceMetrics,
    store: Arc<dyn CatalogStore>,
}

impl AppState {
    /// Build application state.
    /// Returns Result so main can handle registration errors without panicking.
    pub fn new(cfg: ServiceConfig, store: Arc<dyn CatalogStore>) -> Result<Self> {
        let registry = Registry::new();
        let metrics = ServiceMetrics::register(&registry)?;
        Ok(Self {
            inner: Arc::new(AppStateInner { cfg, registry, metrics, store }),
        })
    }

    pub fn cfg(&self) -> &ServiceConfig {
        &self.inner.cfg
    }

    pub fn registry(&self) -> &Registry {
        &self.inner.registry
    }

    pub fn metrics(&self) -> &ServiceMetrics {
        &self.inner.metrics
    }

    pub fn store(&self) -> Arc<dyn CatalogStore> {
        Arc::clone(&self.inner.store)
    }
}
