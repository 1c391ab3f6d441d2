pub mod health;

use axum::{
    routing::{get, patch, post, put},
    Router,
};

use crate::okr::handlers;
use crate::performance::handlers::handle_employee_performance;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Objectives and key results
        .route("/api/v1/okrs", post(handlers::handle_create_okr))
        .route(
            "/api/v1/okrs/employee/:employee_id",
            get(handlers::handle_list_employee_okrs),
        )
        .route("/api/v1/okrs/:id", get(handlers::handle_get_okr))
        .route(
            "/api/v1/okrs/:id/key-results/:index",
            put(handlers::handle_update_key_result),
        )
        .route(
            "/api/v1/okrs/:id/key-results/:index/status",
            patch(handlers::handle_set_key_result_status),
        )
        .route(
            "/api/v1/okrs/:id/ai-insights",
            post(handlers::handle_generate_insights),
        )
        .route("/api/v1/okrs/:id/review", put(handlers::handle_attach_review))
        // Period rollover
        .route(
            "/api/v1/okr-periods/archive",
            post(handlers::handle_archive_period),
        )
        // Performance rollup
        .route(
            "/api/v1/employees/:employee_id/performance",
            get(handle_employee_performance),
        )
        .with_state(state)
}
