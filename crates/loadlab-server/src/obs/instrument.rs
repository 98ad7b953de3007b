//! Per-request instrumentation middleware.
//!
//! Every request takes an in-flight slot ([`InFlight`]) before the handler
//! runs. The slot records the completion metrics when it is dropped, so the
//! observation and the gauge decrement happen on every exit path: normal
//! return, a panic caught here, or the request future being dropped.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::time::Instant;

use axum::extract::{MatchedPath, Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use futures_util::FutureExt;

use crate::app_state::AppState;
use crate::error::ApiError;
use crate::obs::ServiceMetrics;

/// Endpoint label for requests no route matched.
pub const UNMATCHED_ENDPOINT: &str = "unmatched";

/// In-flight slot for one request.
///
/// Holds the last status written for the response. A slot dropped without a
/// recorded status counts as a 500.
pub struct InFlight {
    metrics: ServiceMetrics,
    method: String,
    endpoint: String,
    start: Instant,
    status: Option<StatusCode>,
}

impl InFlight {
    pub fn begin(
        metrics: &ServiceMetrics,
        method: impl Into<String>,
        endpoint: impl Into<String>,
    ) -> Self {
        metrics.active_requests.inc(&[]);
        Self {
            metrics: metrics.clone(),
            method: method.into(),
            endpoint: endpoint.into(),
            start: Instant::now(),
            status: None,
        }
    }

    /// Record the status the response carries.
    pub fn record_status(&mut self, status: StatusCode) {
        self.status = Some(status);
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        let elapsed = self.start.elapsed();
        let status = self.status.unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let code = status.as_u16();
        let m = &self.metrics;

        let code_label = code.to_string();
        let (method, endpoint) = (self.method.as_str(), self.endpoint.as_str());

        m.requests_total.inc(&[method, endpoint, code_label.as_str()]);
        if (200..400).contains(&code) {
            m.requests_success.inc(&[]);
        } else {
            m.requests_failed.inc(&[]);
        }
        m.request_duration.observe_duration(&[method, endpoint], elapsed);
        m.active_requests.dec(&[]);

        tracing::debug!(
            method,
            endpoint,
            status = code,
            elapsed_ms = elapsed.as_millis() as u64,
            "request completed"
        );
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}

/// Axum middleware: `middleware::from_fn_with_state(state, track_requests)`.
pub async fn track_requests(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let method = req.method().to_string();
    let endpoint = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_owned())
        .unwrap_or_else(|| UNMATCHED_ENDPOINT.to_owned());

    let mut flight = InFlight::begin(state.metrics(), method, endpoint);

    let response = match AssertUnwindSafe(next.run(req)).catch_unwind().await {
        Ok(resp) => resp,
        Err(payload) => {
            tracing::error!(
                method = %flight.method,
                endpoint = %flight.endpoint,
                panic = panic_message(payload.as_ref()),
                "handler panicked"
            );
            ApiError::internal("handler terminated abnormally").into_response()
        }
    };

    flight.record_status(response.status());
    response
}
