//! Health check endpoint

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;

use super::state::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub version: String,
    pub issuer: String,
    pub signing_keys: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accounts: Option<usize>,
}

#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
}

/// 200 while the account store answers, 503 otherwise
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let accounts = state.accounts.count().await.ok();
    let status = if accounts.is_some() {
        HealthStatus::Healthy
    } else {
        HealthStatus::Degraded
    };

    let response = HealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION").to_string(),
        issuer: state.token_factory.issuer().to_string(),
        signing_keys: state
            .token_factory
            .keys()
            .keys()
            .iter()
            .filter(|key| key.has_private_key())
            .count(),
        accounts,
    };

    let code = match status {
        HealthStatus::Healthy => StatusCode::OK,
        HealthStatus::Degraded => StatusCode::SERVICE_UNAVAILABLE,
    };

    (code, Json(response))
}
