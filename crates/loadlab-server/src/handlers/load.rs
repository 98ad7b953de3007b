//! Synthetic load generators.
//!
//! Query values are taken as raw strings and resolved by
//! `loadlab_core::load::params`; a malformed query string is treated as empty
//! so these handlers have no rejection path.

use std::time::Duration;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::Deserialize;
use serde_json::{json, Value};

use loadlab_core::error::LoadLabError;
use loadlab_core::load::{self, cpu::YIELD_EVERY, params, CpuBurn};

use crate::app_state::AppState;
use crate::error::ApiError;

/// Statuses the chaos endpoint draws from.
pub const CHAOS_STATUSES: [StatusCode; 5] = [
    StatusCode::BAD_REQUEST,
    StatusCode::NOT_FOUND,
    StatusCode::INTERNAL_SERVER_ERROR,
    StatusCode::BAD_GATEWAY,
    StatusCode::SERVICE_UNAVAILABLE,
];

#[derive(Debug, Default, Deserialize)]
pub struct CpuQuery {
    pub iterations: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct MemoryQuery {
    pub size_mb: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct DelayQuery {
    pub delay_seconds: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ChaosQuery {
    pub error_rate: Option<String>,
}

fn or_default<T: Default>(q: Option<Query<T>>) -> T {
    q.map(|Query(v)| v).unwrap_or_default()
}

pub async fn cpu_intensive(
    State(state): State<AppState>,
    q: Option<Query<CpuQuery>>,
) -> Json<Value> {
    let iterations = params::iterations(or_default(q).iterations.as_deref());
    state.metrics().cpu_tasks.inc(&[]);

    let mut burn = CpuBurn::new(iterations);
    while !burn.advance(YIELD_EVERY) {
        tokio::task::yield_now().await;
    }

    Json(json!({
        "iterations": iterations,
        "hash": burn.digest(),
    }))
}

pub async fn memory_intensive(q: Option<Query<MemoryQuery>>) -> Result<Json<Value>, ApiError> {
    let size_mb = params::size_mb(or_default(q).size_mb.as_deref());

    tokio::task::spawn_blocking(move || load::commit_buffers(size_mb, &mut rand::thread_rng()))
        .await
        .map_err(|e| ApiError::internal(format!("memory task: {e}")))?;

    Ok(Json(json!({ "allocated_mb": size_mb })))
}

pub async fn simulate_delay(q: Option<Query<DelayQuery>>) -> Json<Value> {
    let delay = params::delay_seconds(or_default(q).delay_seconds.as_deref());

    tokio::time::sleep(Duration::from_secs_f64(delay)).await;

    Json(json!({
        "message": "ok",
        "delay_seconds": delay,
    }))
}

pub async fn random_error(q: Option<Query<ChaosQuery>>) -> Result<Json<Value>, ApiError> {
    let rate = params::error_rate(or_default(q).error_rate.as_deref());

    let failure = {
        let mut rng = rand::thread_rng();
        if rng.gen_bool(rate) {
            CHAOS_STATUSES.choose(&mut rng).copied()
        } else {
            None
        }
    };

    if let Some(status) = failure {
        let msg = format!("simulated error: {}", status.as_u16());
        let err = if status.is_client_error() {
            LoadLabError::BadRequest(msg)
        } else {
            LoadLabError::Internal(msg)
        };
        return Err(ApiError::new(status, err));
    }

    Ok(Json(json!({
        "message": "ok",
        "error_rate": rate,
    })))
}
