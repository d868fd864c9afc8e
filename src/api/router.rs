use axum::{routing::get, Router};
use tower_http::trace::TraceLayer;

use super::auth;
use super::health;
use super::middleware::WellKnownJwksLayer;
use super::state::AppState;

/// Full router: health, demo login routes and the JWKS document
pub fn create_router(state: AppState, well_known: WellKnownJwksLayer) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .merge(auth::create_auth_router(&state))
        .with_state(state)
        .layer(well_known)
        .layer(TraceLayer::new_for_http())
}
