//! Domain layer - keys, claims, tokens and the authentication seams

pub mod account;
pub mod auth;
pub mod error;
pub mod jwk;
pub mod token;

pub use account::{Account, AccountStore};
pub use auth::{Authenticator, Authorizer, PermitAll};
pub use error::DomainError;
pub use jwk::{Jwk, JwkSetDocument, KeySet, KeyUse, PublicJwk};
pub use token::{ClaimsSet, Credential, CredentialLocation, SignedToken};
