pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::screening::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/v1/screening/run", post(handlers::handle_start_run))
        .route(
            "/api/v1/screening/candidates",
            get(handlers::handle_list_candidates),
        )
        .route(
            "/api/v1/screening/candidates/:id/outreach",
            post(handlers::handle_draft_outreach),
        )
        .route(
            "/api/v1/screening/candidates/:id/contacted",
            post(handlers::handle_mark_contacted),
        )
        .route("/api/v1/screening/reset", post(handlers::handle_reset))
        // Resume batches can carry many files; the per-file cap is enforced
        // in the run handler.
        .layer(DefaultBodyLimit::max(64 * 1024 * 1024))
        .with_state(state)
}
