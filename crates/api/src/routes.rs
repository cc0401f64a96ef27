use std::sync::Arc;
use std::time::Instant;

use axum::routing::get;
use axum::Router;
use sqlx::SqlitePool;
use taskgenie_domain::service::TaskService;
use taskgenie_infrastructure::StoreState;

use crate::handlers::tasks::{create_task, delete_task, get_task, list_tasks, update_task};
use crate::handlers::telemetry::{get_telemetry, health_check};
use crate::middleware;

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<TaskService>,
    pub pool: SqlitePool,
    pub store_state: StoreState,
    pub version: &'static str,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(service: Arc<TaskService>, pool: SqlitePool, store_state: StoreState) -> Self {
        Self {
            service,
            pool,
            store_state,
            version: env!("CARGO_PKG_VERSION"),
            started_at: Instant::now(),
        }
    }
}

pub fn create_routes(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/telemetry", get(get_telemetry))
        .route("/tasks", get(list_tasks).post(create_task))
        .route(
            "/tasks/{id}",
            get(get_task).patch(update_task).delete(delete_task),
        )
        .layer(axum::middleware::from_fn(middleware::request_context))
        .layer(middleware::cors_layer())
        .layer(middleware::trace_layer())
        .with_state(state)
}
