//! Metric families published by the service.

use std::sync::Arc;

use loadlab_core::error::Result;

use super::registry::{CounterVec, GaugeVec, HistogramVec, Registry, DEFAULT_BUCKETS};

/// Handles to every family the middleware, handlers and sampler write to.
///
/// Built once by [`ServiceMetrics::register`]; registering twice against the
/// same [`Registry`] fails on the first duplicate name.
#[derive(Clone)]
pub struct ServiceMetrics {
    pub requests_total: Arc<CounterVec>,
    pub requests_success: Arc<CounterVec>,
    pub requests_failed: Arc<CounterVec>,
    pub request_duration: Arc<HistogramVec>,
    pub active_requests: Arc<GaugeVec>,
    pub db_operations: Arc<CounterVec>,
    pub db_rows: Arc<GaugeVec>,
    pub db_size_bytes: Arc<GaugeVec>,
    pub cpu_tasks: Arc<CounterVec>,
}

impl ServiceMetrics {
    pub fn register(reg: &Registry) -> Result<Self> {
        Ok(Self {
            requests_total: reg.counter(
                "api_requests_total",
                "Total API requests",
                &["method", "endpoint", "status"],
            )?,
            requests_success: reg.counter(
                "api_requests_success_total",
                "Total successful requests",
                &[],
            )?,
            requests_failed: reg.counter(
                "api_requests_failed_total",
                "Total failed requests",
                &[],
            )?,
            request_duration: reg.histogram(
                "api_request_duration_seconds",
                "API request duration in seconds",
                &["method", "endpoint"],
                &DEFAULT_BUCKETS,
            )?,
            active_requests: reg.gauge("api_active_requests", "Active API requests", &[])?,
            db_operations: reg.counter(
                "db_operations_total",
                "Total database operations",
                &["operation"],
            )?,
            db_rows: reg.gauge("db_rows", "Database rows (approx)", &[])?,
            db_size_bytes: reg.gauge("db_size_bytes", "Database size in bytes", &[])?,
            cpu_tasks: reg.counter("cpu_intensive_tasks_total", "Total CPU intensive tasks", &[])?,
        })
    }
}
