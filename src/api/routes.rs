use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use super::handlers;
use crate::AppState;

/// JSON body limit -- image payloads arrive inline as base64.
const BODY_LIMIT_BYTES: usize = 50 * 1024 * 1024;

pub fn create_router(state: Arc<AppState>) -> Router {
    let auth_routes = Router::new()
        .route("/api/auth/register", post(handlers::register))
        .route("/api/auth/login", post(handlers::login))
        .route("/api/auth/logout", post(handlers::logout))
        .route("/api/auth/me", get(handlers::me));

    // Public board routes -- submission takes optional auth, the read is open
    let board_routes = Router::new()
        .route("/api/save-request", post(handlers::save_request))
        .route("/api/load-project", get(handlers::load_project));

    // Admin routes -- each handler guards itself with RequireAdmin
    let admin_routes = Router::new()
        .route("/api/admin/approve/:id", post(handlers::approve_request))
        .route("/api/admin/reject/:id", post(handlers::reject_request))
        .route("/api/admin/change-status/:id", post(handlers::change_status))
        .route("/api/admin/requests", get(handlers::list_requests));

    Router::new()
        .merge(auth_routes)
        .merge(board_routes)
        .merge(admin_routes)
        .layer(DefaultBodyLimit::max(BODY_LIMIT_BYTES))
        .layer(CorsLayer::very_permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
