//! HTTP surface of the DBT portal.
//!
//! Handlers run database work on the blocking pool and answer JSON, or a
//! file download for report exports. Everything except `/health` and
//! `/auth/*` sits behind the JWT middleware.

pub mod auth;
pub mod error;
pub mod events;
pub mod middleware;
pub mod navigation;
pub mod profiles;
pub mod provider;
pub mod quiz;
pub mod reports;
pub mod tickets;

use axum::{
    Router, middleware as axum_middleware,
    routing::{get, post},
};

use crate::auth::AppState;

pub use crate::error::ApiError;
pub use crate::provider::DataPolicy;

/// All routes, with state applied. Cross-cutting layers (CORS, tracing)
/// are added by the binary.
pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/health", get(navigation::health))
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .with_state(state.clone());

    let protected_routes = Router::new()
        .route("/profiles/me", get(profiles::me))
        .route("/profiles/{id}", get(profiles::get_profile))
        .route("/navigation", get(navigation::navigation))
        .route("/tickets", get(tickets::queue).post(tickets::submit))
        .route("/tickets/mine", get(tickets::mine))
        .route("/tickets/{id}/history", get(tickets::history))
        .route("/tickets/{id}/verify", post(tickets::verify))
        .route("/tickets/{id}/reject", post(tickets::reject))
        .route("/tickets/{id}/finalize", post(tickets::finalize))
        .route("/tickets/{id}/reapply", post(tickets::reapply))
        .route("/events", get(events::list_events).post(events::create_event))
        .route("/events/{id}/report", post(events::submit_report))
        .route("/events/{id}/export", post(reports::export_event))
        .route("/reports/metrics", post(reports::export_metrics))
        .route("/reports/guide", post(reports::export_guide))
        .route("/dashboard", get(provider::dashboard))
        .route("/quiz", get(quiz::get_quiz))
        .route("/quiz/score", post(quiz::score_quiz))
        .layer(axum_middleware::from_fn_with_state(state.clone(), middleware::require_auth))
        .with_state(state);

    Router::new().merge(public_routes).merge(protected_routes)
}
