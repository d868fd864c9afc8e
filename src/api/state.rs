//! Application state shared by the HTTP handlers

use std::sync::Arc;

use crate::api::middleware::JwtGuard;
use crate::domain::{Account, AccountStore};
use crate::infrastructure::auth::TokenFactory;

#[derive(Clone)]
pub struct AppState {
    pub token_factory: TokenFactory,
    pub accounts: Arc<dyn AccountStore>,
    pub guard: JwtGuard<Account>,
    /// Cookie set on login, `None` when cookie lookup is disabled
    pub cookie_name: Option<String>,
}

impl AppState {
    pub fn new(
        token_factory: TokenFactory,
        accounts: Arc<dyn AccountStore>,
        guard: JwtGuard<Account>,
    ) -> Self {
        Self {
            token_factory,
            accounts,
            guard,
            cookie_name: Some("token".to_string()),
        }
    }

    pub fn with_cookie_name(mut self, cookie_name: Option<String>) -> Self {
        self.cookie_name = cookie_name;
        self
    }
}
