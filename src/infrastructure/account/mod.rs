//! Demo account store, password hashing and claim mapping

mod authenticator;
mod in_memory;
mod password;

pub use authenticator::{AccountClaimsAuthenticator, AccountRoleAuthorizer};
pub use in_memory::InMemoryAccountStore;
pub use password::{Argon2Hasher, PasswordHasher};
