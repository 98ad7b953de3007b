//! On-demand catalog stats.

use axum::{extract::State, Json};
use serde_json::{json, Value};
use tokio::time::Instant;

use crate::app_state::AppState;
use crate::store;

/// Both queries share one deadline. A failed query reports 0 and leaves its
/// gauge untouched.
pub async fn stats(State(state): State<AppState>) -> Json<Value> {
    let deadline = Instant::now() + state.cfg().stats.query_timeout();
    let catalog = state.store();
    let m = state.metrics();

    let db_rows = match store::until(deadline, "table count", catalog.table_count()).await {
        Ok(n) => {
            m.db_rows.set(&[], n as f64);
            n
        }
        Err(e) => {
            tracing::debug!(error = %e, "stats: table count unavailable");
            0
        }
    };

    let size_query = catalog.total_size_bytes();
    let db_size_bytes = match store::until(deadline, "database size", size_query).await {
        Ok(n) => {
            m.db_size_bytes.set(&[], n as f64);
            n
        }
        Err(e) => {
            tracing::debug!(error = %e, "stats: database size unavailable");
            0
        }
    };

    m.db_operations.inc(&["stats"]);

    Json(json!({
        "db_rows": db_rows,
        "db_size_bytes": db_size_bytes,
    }))
}
