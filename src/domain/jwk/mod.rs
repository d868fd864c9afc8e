//! JSON Web Keys and key sets

mod key;
mod set;

pub use key::{is_rsa_algorithm, thumbprint, Jwk, KeyUse, PublicJwk, MIN_RSA_KEY_BITS};
pub use set::{JwkSetDocument, KeySet};
