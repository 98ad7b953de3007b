//! loadlab-server
//!
//! Synthetic CPU / memory / latency load behind a fully instrumented HTTP
//! surface, plus a background sampler publishing catalog size from Postgres.

use std::sync::Arc;

use tracing_subscriber::{fmt, EnvFilter};

use loadlab_core::error::{LoadLabError, Result};
use loadlab_server::{app_state, config, router, sampler::Sampler, store::PgCatalog};

#[tokio::main]
async fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).init();

    if let Err(e) = run().await {
        tracing::error!(error = %e, "loadlab-server failed");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cfg = config::load()?;
    let listen = cfg.server.listen_addr();

    let catalog = Arc::new(PgCatalog::connect_lazy(&cfg.database)?);
    let state = app_state::AppState::new(cfg, catalog.clone())?;
    let sampler = Sampler::from_state(&state).spawn();
    let app = router::build_router(state);

    tracing::info!(%listen, "loadlab-server starting");
    let listener = tokio::net::TcpListener::bind(listen)
        .await
        .map_err(|e| LoadLabError::Internal(format!("bind {listen} failed: {e}")))?;

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| LoadLabError::Internal(format!("server failed: {e}")));

    sampler.abort();
    catalog.close().await;
    tracing::info!("loadlab-server stopped");
    served
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "ctrl-c handler unavailable");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "SIGTERM handler unavailable");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("shutdown signal received; draining");
}
