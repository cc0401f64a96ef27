use axum::extract::State;
use axum::Json;
use serde_json::{json, Value};
use taskgenie_infrastructure::{Migrator, StoreState};

use crate::routes::AppState;

pub async fn health_check(State(state): State<AppState>) -> Json<Value> {
    Json(json!({ "status": "ok", "version": state.version }))
}

/// System health and uptime report. Always answers 200; degradation is
/// reported in the payload so probes can read it without special-casing
/// status codes.
pub async fn get_telemetry(State(state): State<AppState>) -> Json<Value> {
    let (connected, db_error) = match sqlx::query("SELECT 1").execute(&state.pool).await {
        Ok(_) => (true, None),
        Err(err) => (false, Some(err.to_string())),
    };

    let migration_version = Migrator::new(state.pool.clone())
        .current_version()
        .await
        .ok()
        .flatten();

    let status = if connected && state.store_state == StoreState::Ready {
        "ok"
    } else {
        "degraded"
    };

    let mut db = json!({
        "connected": connected,
        "migration_version": migration_version,
    });
    if let Some(error) = db_error {
        db["error"] = json!(error);
    }

    Json(json!({
        "status": status,
        "version": state.version,
        "uptime_s": state.started_at.elapsed().as_secs(),
        "store_state": state.store_state.as_str(),
        "db": db,
    }))
}
