//! API middleware components

pub mod credentials;
pub mod jwt_auth;
pub mod unauthorized;
pub mod well_known;

pub use credentials::CredentialExtractor;
pub use jwt_auth::{require_jwt, Authenticated, JwtAuthFilter, JwtAuthOptions, JwtGuard};
pub use unauthorized::{DefaultUnauthorizedHandler, UnauthorizedHandler};
pub use well_known::{WellKnownJwks, WellKnownJwksLayer, WELL_KNOWN_JWKS_PATH};
