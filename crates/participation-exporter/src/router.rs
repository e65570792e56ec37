//! Axum router construction for the exporter.

use axum::routing::get;
use axum::Router;
use participation_core::ParticipationSource;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

/// Build the Axum router serving `GET /metrics`.
pub fn build_router<S>(state: AppState<S>) -> Router
where
    S: ParticipationSource + Send + 'static,
{
    Router::new()
        .route("/metrics", get(handlers::metrics::<S>))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
