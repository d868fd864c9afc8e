//! JOSE session tokens
//!
//! Stateless JWT sessions for HTTP services:
//! - Key sets loaded from PKCS#8 or JWKS key stores (file, URL, resource or inline)
//! - Token minting with issuer, unique id, issue and expiry claims
//! - Request authentication from query parameter, cookie or bearer header
//! - Publication of the public keys at `/.well-known/jwks.json`

pub mod api;
pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

#[cfg(test)]
pub(crate) mod test_support;

pub use config::AppConfig;

use std::sync::Arc;

use axum::Router;
use tracing::info;

use api::middleware::{JwtAuthFilter, JwtAuthOptions, JwtGuard, WellKnownJwksLayer};
use api::state::AppState;
use domain::Account;
use infrastructure::account::{AccountClaimsAuthenticator, AccountRoleAuthorizer, InMemoryAccountStore};
use infrastructure::auth::JwtBundle;

/// Load the key store and build the shared state of the demo application
pub async fn create_app_state(config: &AppConfig) -> anyhow::Result<(AppState, WellKnownJwksLayer)> {
    let bundle = JwtBundle::new(config.jwt.clone())?;

    let keys = bundle.key_set().await?;
    let token_factory = bundle.token_factory().await?.clone();

    let mut options = JwtAuthOptions::<Account>::from_bundle(&bundle).await?;
    options.authenticator = Some(Arc::new(AccountClaimsAuthenticator));
    options.authorizer = Arc::new(AccountRoleAuthorizer);
    let filter = JwtAuthFilter::new(options)?;

    let accounts = InMemoryAccountStore::from_config(&config.accounts)?;
    let well_known = WellKnownJwksLayer::new(&keys)?;

    info!(
        issuer = %config.jwt.issuer,
        keys = keys.len(),
        accounts = config.accounts.len(),
        "Application state ready"
    );

    let state = AppState::new(token_factory, Arc::new(accounts), JwtGuard::new(Arc::new(filter)))
        .with_cookie_name(config.jwt.cookie().map(str::to_string));

    Ok((state, well_known))
}

/// Router of the demo application
pub async fn create_app(config: &AppConfig) -> anyhow::Result<Router> {
    let (state, well_known) = create_app_state(config).await?;
    Ok(api::create_router(state, well_known))
}
