//! API layer - HTTP endpoints and middleware

pub mod auth;
pub mod health;
pub mod middleware;
pub mod router;
pub mod state;
pub mod types;

pub use middleware::{require_jwt, Authenticated, JwtAuthFilter, JwtAuthOptions, JwtGuard};
pub use router::create_router;
pub use state::AppState;
