//! Token value types: claims, signed tokens and credential locations

mod claims;
mod credential;
mod signed;

pub use claims::{ClaimsSet, EXPIRATION, ISSUED_AT, ISSUER, JWT_ID, REGISTERED_CLAIMS};
pub use credential::{Credential, CredentialLocation};
pub use signed::SignedToken;
