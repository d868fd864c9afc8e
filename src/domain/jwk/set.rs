//! Ordered, immutable collection of keys

use std::collections::HashSet;

use jsonwebtoken::Algorithm;
use serde::{Deserialize, Serialize, Serializer};

use super::key::{Jwk, PublicJwk};
use crate::domain::DomainError;

/// An ordered set of RSA keys, built once at startup and never mutated
#[derive(Debug, Clone, Default)]
pub struct KeySet {
    keys: Vec<Jwk>,
}

impl KeySet {
    /// Create a key set; key ids must be unique
    pub fn new(keys: Vec<Jwk>) -> Result<Self, DomainError> {
        let mut seen = HashSet::new();
        for key in &keys {
            if !seen.insert(key.kid()) {
                return Err(DomainError::configuration(format!(
                    "Duplicate key id '{}' in key set",
                    key.kid()
                )));
            }
        }

        Ok(Self { keys })
    }

    pub fn keys(&self) -> &[Jwk] {
        &self.keys
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn get(&self, kid: &str) -> Option<&Jwk> {
        self.keys.iter().find(|k| k.kid() == kid)
    }

    pub fn has_private_keys(&self) -> bool {
        self.keys.iter().any(Jwk::has_private_key)
    }

    /// Same keys, in the same order, without any private component
    pub fn to_public(&self) -> KeySet {
        KeySet {
            keys: self.keys.iter().map(Jwk::to_public).collect(),
        }
    }

    /// First key able to sign with `algorithm`
    pub fn signing_key(&self, algorithm: Algorithm) -> Option<&Jwk> {
        self.keys
            .iter()
            .find(|k| k.has_private_key() && k.supports(algorithm))
    }

    /// Candidate keys for verifying a token signed with `algorithm`.
    ///
    /// A `kid` from the token header narrows the candidates to that key.
    pub fn verification_keys<'a>(
        &'a self,
        algorithm: Algorithm,
        kid: Option<&'a str>,
    ) -> impl Iterator<Item = &'a Jwk> + 'a {
        self.keys
            .iter()
            .filter(move |k| k.supports(algorithm))
            .filter(move |k| kid.is_none_or(|kid| k.kid() == kid))
    }

    /// Public JSON document for this set
    pub fn to_document(&self) -> JwkSetDocument {
        JwkSetDocument {
            keys: self.keys.iter().map(Jwk::to_public_jwk).collect(),
        }
    }
}

impl Serialize for KeySet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_document().serialize(serializer)
    }
}

/// Standard `{"keys": [...]}` key set document with public parameters only
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwkSetDocument {
    pub keys: Vec<PublicJwk>,
}
