//! End-to-end behaviour through the instrumented router.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

mod common;

use std::time::{Duration, Instant};

use axum::http::{Method, StatusCode};
use axum::{middleware, routing::get, Router};
use futures_util::future::join_all;

use common::{send, send_json, state_with, FakeCatalog, Reply};
use loadlab_server::handlers::load::CHAOS_STATUSES;
use loadlab_server::obs::instrument;
use loadlab_server::router::build_router;

fn is_lower_hex_256(s: &str) -> bool {
    s.len() == 64 && s.bytes().all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
}

fn app() -> (Router, loadlab_server::app_state::AppState) {
    let state = state_with(FakeCatalog::new(Reply::Value(12), Reply::Value(4096)));
    (build_router(state.clone()), state)
}

#[tokio::test]
async fn root_and_health() {
    let (app, _) = app();

    let (status, body) = send_json(&app, Method::GET, "/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["docs"], "/metrics");
    assert_eq!(body["health"], "/health");
    assert!(body["message"].is_string());

    let (status, body) = send_json(&app, Method::GET, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, serde_json::json!({ "status": "healthy" }));
}

#[tokio::test]
async fn cpu_burner_echoes_iterations_and_digest() {
    let (app, state) = app();

    let (status, body) = send_json(&app, Method::POST, "/cpu-intensive?iterations=5000").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["iterations"], 5000);
    assert!(is_lower_hex_256(body["hash"].as_str().unwrap()));

    for q in ["iterations=0", "iterations=-3", "iterations=lots", ""] {
        let (status, body) = send_json(&app, Method::POST, &format!("/cpu-intensive?{q}")).await;
        assert_eq!(status, StatusCode::OK, "query {q:?}");
        assert_eq!(body["iterations"], 1_000_000, "query {q:?}");
    }
    assert_eq!(state.metrics().cpu_tasks.get(&[]), 5);
}

#[tokio::test]
async fn same_iterations_same_hash() {
    let (app, _) = app();
    let (_, a) = send_json(&app, Method::POST, "/cpu-intensive?iterations=777").await;
    let (_, b) = send_json(&app, Method::POST, "/cpu-intensive?iterations=777").await;
    assert_eq!(a["hash"], b["hash"]);
}

#[tokio::test]
async fn memory_allocator_bounds() {
    let (app, _) = app();

    let (status, body) = send_json(&app, Method::POST, "/memory-intensive?size_mb=3").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, serde_json::json!({ "allocated_mb": 3 }));

    for q in ["size_mb=0", "size_mb=101", "size_mb=big"] {
        let (_, body) = send_json(&app, Method::POST, &format!("/memory-intensive?{q}")).await;
        assert_eq!(body["allocated_mb"], 10, "query {q:?}");
    }
}

#[tokio::test]
async fn delay_waits_at_least_requested_time() {
    let (app, _) = app();

    let started = Instant::now();
    let (status, body) = send_json(&app, Method::POST, "/simulate-delay?delay_seconds=0.2").await;
    assert!(started.elapsed() >= Duration::from_millis(200));
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["delay_seconds"], 0.2);
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn delay_out_of_range_uses_default() {
    let (app, _) = app();

    let started = Instant::now();
    let (_, body) = send_json(&app, Method::POST, "/simulate-delay?delay_seconds=11").await;
    assert_eq!(body["delay_seconds"], 1.0);
    assert!(started.elapsed() >= Duration::from_secs(1));
}

#[tokio::test]
async fn delay_does_not_block_other_requests() {
    let (app, _) = app();

    let slow = send(&app, Method::POST, "/simulate-delay?delay_seconds=0.5");
    let fast = async {
        tokio::time::sleep(Duration::from_millis(20)).await;
        let started = Instant::now();
        let (status, _) = send(&app, Method::GET, "/health").await;
        (status, started.elapsed())
    };

    let ((slow_status, _), (fast_status, fast_elapsed)) = tokio::join!(slow, fast);
    assert_eq!(slow_status, StatusCode::OK);
    assert_eq!(fast_status, StatusCode::OK);
    assert!(fast_elapsed < Duration::from_millis(300), "health took {fast_elapsed:?}");
}

#[tokio::test]
async fn concurrent_requests_are_counted_exactly() {
    let (app, state) = app();
    let m = state.metrics();
    let labels = ["GET", "/health", "200"];

    send(&app, Method::GET, "/health").await;
    let before = m.requests_total.get(&labels);
    let success_before = m.requests_success.get(&[]);

    const N: usize = 64;
    let results = join_all((0..N).map(|_| send(&app, Method::GET, "/health"))).await;
    assert!(results.iter().all(|(s, _)| *s == StatusCode::OK));

    assert_eq!(m.requests_total.get(&labels), before + N as u64);
    assert_eq!(m.requests_success.get(&[]), success_before + N as u64);
    assert_eq!(m.request_duration.count(&["GET", "/health"]), before + N as u64);
    assert_eq!(m.active_requests.get(&[]), 0.0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_requests_across_worker_threads() {
    let (app, state) = app();

    const N: usize = 40;
    let handles: Vec<_> = (0..N)
        .map(|_| {
            let app = app.clone();
            tokio::spawn(async move {
                send(&app, Method::POST, "/cpu-intensive?iterations=20000").await
            })
        })
        .collect();
    for h in handles {
        assert_eq!(h.await.unwrap().0, StatusCode::OK);
    }

    let m = state.metrics();
    assert_eq!(m.requests_total.get(&["POST", "/cpu-intensive", "200"]), N as u64);
    assert_eq!(m.active_requests.get(&[]), 0.0);
}

#[tokio::test]
async fn panicking_handler_is_recorded_as_failure() {
    let state = state_with(FakeCatalog::new(Reply::Value(0), Reply::Value(0)));
    let app = Router::new()
        .route("/boom", get(|| async { panic!("boom") as () }))
        .route("/fine", get(|| async { "fine" }))
        .layer(middleware::from_fn_with_state(state.clone(), instrument::track_requests))
        .with_state(state.clone());

    let (status, body) = send_json(&app, Method::GET, "/boom").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["code"], "INTERNAL");

    let m = state.metrics();
    assert_eq!(m.requests_total.get(&["GET", "/boom", "500"]), 1);
    assert_eq!(m.requests_failed.get(&[]), 1);
    assert_eq!(m.request_duration.count(&["GET", "/boom"]), 1);
    assert_eq!(m.active_requests.get(&[]), 0.0);

    // the service keeps serving afterwards
    let (status, _) = send(&app, Method::GET, "/fine").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(m.requests_success.get(&[]), 1);
}

#[tokio::test]
async fn unknown_path_uses_unmatched_endpoint_label() {
    let (app, state) = app();

    let (status, _) = send(&app, Method::GET, "/nope").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let m = state.metrics();
    assert_eq!(m.requests_total.get(&["GET", "unmatched", "404"]), 1);
    assert_eq!(m.requests_total.get(&["GET", "/nope", "404"]), 0);
    assert_eq!(m.requests_failed.get(&[]), 1);
    assert_eq!(m.active_requests.get(&[]), 0.0);
}

#[tokio::test]
async fn dropped_request_is_recorded_as_500() {
    let (app, state) = app();

    let cut_short = tokio::time::timeout(
        Duration::from_millis(50),
        send(&app, Method::POST, "/simulate-delay?delay_seconds=5"),
    )
    .await;
    assert!(cut_short.is_err(), "delay finished before the caller gave up");

    let m = state.metrics();
    assert_eq!(m.active_requests.get(&[]), 0.0);
    assert_eq!(m.requests_total.get(&["POST", "/simulate-delay", "500"]), 1);
    assert_eq!(m.requests_failed.get(&[]), 1);
    assert_eq!(m.requests_success.get(&[]), 0);
}

#[tokio::test]
async fn chaos_endpoint_feeds_failure_counter() {
    let (app, state) = app();
    let m = state.metrics();

    let (status, body) = send_json(&app, Method::POST, "/random-error?error_rate=0").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["error_rate"], 0.0);

    for _ in 0..10 {
        let (status, body) = send_json(&app, Method::POST, "/random-error?error_rate=1").await;
        assert!(CHAOS_STATUSES.contains(&status), "unexpected {status}");
        assert!(body["message"].as_str().unwrap().contains(&status.as_u16().to_string()));
    }
    assert_eq!(m.requests_failed.get(&[]), 10);
    assert_eq!(m.requests_success.get(&[]), 1);
}

#[tokio::test]
async fn scrape_during_traffic_is_well_formed() {
    let (app, _) = app();

    let traffic = join_all((0..8).map(|i| {
        let app = app.clone();
        async move {
            if i % 2 == 0 {
                send(&app, Method::POST, "/simulate-delay?delay_seconds=0.5").await
            } else {
                send(&app, Method::POST, "/cpu-intensive?iterations=300000").await
            }
        }
    }));
    let scrapes = async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        let mut texts = Vec::new();
        for _ in 0..5 {
            let (status, body) = send(&app, Method::GET, "/metrics").await;
            assert_eq!(status, StatusCode::OK);
            texts.push(String::from_utf8(body).unwrap());
            tokio::task::yield_now().await;
        }
        texts
    };

    let (_, texts) = tokio::join!(traffic, scrapes);
    for text in &texts {
        common::assert_well_formed(text);
        assert!(text.contains("# TYPE api_requests_total counter"));
        assert!(text.contains("# TYPE api_request_duration_seconds histogram"));
    }
    // delay requests were still running during the first scrape; the scrape
    // itself is in flight too
    let first_active = texts[0]
        .lines()
        .find_map(|l| l.strip_prefix("api_active_requests "))
        .unwrap()
        .parse::<f64>()
        .unwrap();
    assert!(first_active >= 2.0, "active = {first_active}");

    let (_, body) = send(&app, Method::GET, "/metrics").await;
    let text = String::from_utf8(body).unwrap();
    let delayed = r#"api_requests_total{method="POST",endpoint="/simulate-delay",status="200"} 4"#;
    assert!(text.contains(delayed));
}

#[tokio::test]
async fn metrics_content_type() {
    let (app, _) = app();
    let req = axum::http::Request::builder()
        .uri("/metrics")
        .body(axum::body::Body::empty())
        .unwrap();
    let resp = tower::ServiceExt::oneshot(app, req).await.unwrap();
    assert_eq!(
        resp.headers()[axum::http::header::CONTENT_TYPE],
        "text/plain; version=0.0.4; charset=utf-8"
    );
}
