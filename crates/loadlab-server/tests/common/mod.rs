//! Shared fixtures: a scriptable catalog store and request helpers.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use serde_json::Value;
use tower::ServiceExt;

use loadlab_core::error::{LoadLabError, Result};
use loadlab_server::app_state::AppState;
use loadlab_server::config::ServiceConfig;
use loadlab_server::store::CatalogStore;

/// How the fake answers one query.
#[derive(Debug, Clone, Copy)]
pub enum Reply {
    Value(i64),
    Fail,
    Hang,
}

impl Reply {
    async fn resolve(self) -> Result<i64> {
        match self {
            Reply::Value(v) => Ok(v),
            Reply::Fail => Err(LoadLabError::Store("connection refused".into())),
            Reply::Hang => std::future::pending::<Result<i64>>().await,
        }
    }
}

pub struct FakeCatalog {
    tables: Mutex<Reply>,
    size: Mutex<Reply>,
    size_calls: AtomicUsize,
}

impl FakeCatalog {
    pub fn new(tables: Reply, size: Reply) -> Arc<Self> {
        Arc::new(Self {
            tables: Mutex::new(tables),
            size: Mutex::new(size),
            size_calls: AtomicUsize::new(0),
        })
    }

    pub fn set_tables(&self, r: Reply) {
        *self.tables.lock().unwrap() = r;
    }

    pub fn set_size(&self, r: Reply) {
        *self.size.lock().unwrap() = r;
    }

    pub fn size_calls(&self) -> usize {
        self.size_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CatalogStore for FakeCatalog {
    async fn table_count(&self) -> Result<i64> {
        let r = *self.tables.lock().unwrap();
        r.resolve().await
    }

    async fn total_size_bytes(&self) -> Result<i64> {
        self.size_calls.fetch_add(1, Ordering::SeqCst);
        let r = *self.size.lock().unwrap();
        r.resolve().await
    }
}

pub fn test_config() -> ServiceConfig {
    let mut cfg = ServiceConfig::default();
    cfg.sampler.interval_ms = 100;
    cfg.sampler.query_timeout_ms = 50;
    cfg.stats.query_timeout_ms = 100;
    cfg
}

pub fn state_with(store: Arc<FakeCatalog>) -> AppState {
    AppState::new(test_config(), store).unwrap()
}

pub async fn send(app: &Router, method: Method, uri: &str) -> (StatusCode, Vec<u8>) {
    let req = Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let body = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    (status, body.to_vec())
}

pub async fn send_json(app: &Router, method: Method, uri: &str) -> (StatusCode, Value) {
    let (status, body) = send(app, method, uri).await;
    (status, serde_json::from_slice(&body).unwrap())
}

/// Check every line of a text snapshot is a comment or `name[{labels}] value`.
pub fn assert_well_formed(text: &str) {
    for line in text.lines() {
        if line.starts_with("# HELP ") || line.starts_with("# TYPE ") {
            continue;
        }
        let (series, value) = line.rsplit_once(' ').unwrap_or_else(|| panic!("no value: {line}"));
        assert!(
            value == "+Inf" || value == "-Inf" || value == "NaN" || value.parse::<f64>().is_ok(),
            "bad value in {line:?}"
        );
        let name = match series.split_once('{') {
            Some((name, rest)) => {
                assert!(rest.ends_with('}'), "unterminated labels in {line:?}");
                name
            }
            None => series,
        };
        assert!(
            !name.is_empty()
                && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == ':'),
            "bad metric name in {line:?}"
        );
    }
}
