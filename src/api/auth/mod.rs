//! Demo login endpoints
//!
//! `POST /login` exchanges a username and password for a token, returned in
//! the body and as a cookie. `GET /me` and `GET /admin` are protected by the
//! JWT guard.

use axum::{
    extract::{rejection::JsonRejection, State},
    middleware::from_fn_with_state,
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::{DateTime, Utc};
use cookie::time::Duration;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::api::middleware::{require_jwt, Authenticated};
use crate::api::state::AppState;
use crate::api::types::ApiError;
use crate::domain::Account;

/// Role required by `GET /admin`
pub const ADMINISTRATOR_ROLE: &str = "administrator";

pub fn create_auth_router(state: &AppState) -> Router<AppState> {
    let authenticated = Router::new()
        .route("/me", get(get_current_account))
        .route("/logout", post(logout))
        .layer(from_fn_with_state(state.guard.clone(), require_jwt::<Account>));

    let administration = Router::new()
        .route("/admin", get(get_admin))
        .layer(from_fn_with_state(
            state.guard.with_role(ADMINISTRATOR_ROLE),
            require_jwt::<Account>,
        ));

    Router::new()
        .route("/login", post(login))
        .merge(authenticated)
        .merge(administration)
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub account: Account,
    pub expires_at: String,
}

#[derive(Debug, Serialize)]
pub struct LogoutResponse {
    pub message: String,
}

/// POST /login
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<(CookieJar, Json<LoginResponse>), ApiError> {
    let Json(request) = payload?;

    let account = state
        .accounts
        .authenticate(&request.username, &request.password)
        .await?
        .ok_or_else(|| ApiError::unauthorized("Invalid username or password"))?;

    let token = state.token_factory.mint(account.to_claims())?;
    let expires_at = token
        .claims()
        .expiration()
        .and_then(|exp| DateTime::<Utc>::from_timestamp(exp, 0))
        .map(|exp| exp.to_rfc3339())
        .unwrap_or_default();

    info!(account = %account.username, "Account logged in");

    let jar = match state.cookie_name.clone() {
        Some(name) => jar.add(
            Cookie::build((name, token.serialize().to_string()))
                .path("/")
                .http_only(true)
                .same_site(SameSite::Lax)
                .max_age(Duration::seconds(state.token_factory.lifetime().num_seconds())),
        ),
        None => jar,
    };

    Ok((
        jar,
        Json(LoginResponse {
            token: token.into_string(),
            account,
            expires_at,
        }),
    ))
}

/// POST /logout. Tokens are stateless; this only clears the cookie.
pub async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
    Authenticated(account): Authenticated<Account>,
) -> (CookieJar, Json<LogoutResponse>) {
    info!(account = %account.username, "Account logged out");

    let jar = match state.cookie_name.clone() {
        Some(name) => {
            let mut removal = Cookie::build((name, "")).path("/").http_only(true).build();
            removal.make_removal();
            jar.add(removal)
        }
        None => jar,
    };

    (
        jar,
        Json(LogoutResponse {
            message: "Logged out successfully".to_string(),
        }),
    )
}

/// GET /me
pub async fn get_current_account(Authenticated(account): Authenticated<Account>) -> Json<Account> {
    Json(account)
}

/// GET /admin
pub async fn get_admin(Authenticated(account): Authenticated<Account>) -> Json<Account> {
    Json(account)
}
