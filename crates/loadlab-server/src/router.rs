//! Axum router wiring.
//!
//! Every route, `/metrics` included, runs inside the instrumentation
//! middleware.

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::app_state::AppState;
use crate::handlers::{load, ops, stats};
use crate::obs::instrument;

pub fn build_router(state: AppState) -> Router {
    routes()
        .layer(middleware::from_fn_with_state(state.clone(), instrument::track_requests))
        .with_state(state)
}

fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(ops::root))
        .route("/health", get(ops::health))
        .route("/metrics", get(ops::metrics))
        .route("/cpu-intensive", post(load::cpu_intensive))
        .route("/memory-intensive", post(load::memory_intensive))
        .route("/simulate-delay", post(load::simulate_delay))
        .route("/random-error", post(load::random_error))
        .route("/stats", get(stats::stats))
}
