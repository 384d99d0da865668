//! Router configuration for the HTTP API.
//!
//! This module sets up all routes, middleware (CORS, compression, tracing),
//! and creates the axum router ready for serving.

use axum::{
    routing::{delete, get, post, put},
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers;
use super::state::AppState;

/// Create the main application router with all routes and middleware.
pub fn create_router(state: AppState) -> Router {
    // CORS configuration - permissive for development, should be restricted in production
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_v1 = Router::new()
        // Daily sessions
        .route("/days/start", post(handlers::start_day))
        .route("/days/end", post(handlers::end_day))
        .route("/days/{user_id}/{date}", get(handlers::get_day))
        .route("/days/{user_id}/{date}/slots", get(handlers::get_slots))
        // Time slots
        .route("/slots", put(handlers::save_slot))
        .route("/slots", delete(handlers::delete_slot))
        // Analytics
        .route("/analytics/{user_id}", get(handlers::get_analytics))
        .route(
            "/analytics/{user_id}/export",
            get(handlers::export_analytics),
        )
        // Push subscriptions
        .route("/push/vapid-public-key", get(handlers::vapid_public_key))
        .route("/push/subscribe", post(handlers::subscribe))
        .route("/push/subscribe", delete(handlers::unsubscribe))
        .route("/push/send", post(handlers::send_push))
        // Reminder dispatch
        .route("/cron/dispatch", post(handlers::cron_dispatch));

    Router::new()
        .route("/health", get(handlers::health_check))
        .nest("/v1", api_v1)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
