//! Signed token minting

use std::fmt::Debug;
use std::sync::Arc;

use chrono::Duration;
use jsonwebtoken::{encode, Algorithm, Header};
use tracing::debug;

use super::clock::{Clock, IdGenerator, SystemClock, UuidGenerator};
use crate::domain::jwk::is_rsa_algorithm;
use crate::domain::token::{EXPIRATION, ISSUED_AT, ISSUER, JWT_ID};
use crate::domain::{ClaimsSet, DomainError, KeySet, SignedToken};

/// Mints signed tokens for one issuer from a key set
#[derive(Clone)]
pub struct TokenFactory {
    keys: Arc<KeySet>,
    issuer: String,
    lifetime: Duration,
    algorithm: Algorithm,
    clock: Arc<dyn Clock>,
    id_generator: Arc<dyn IdGenerator>,
}

impl Debug for TokenFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenFactory")
            .field("issuer", &self.issuer)
            .field("lifetime_secs", &self.lifetime.num_seconds())
            .field("algorithm", &self.algorithm)
            .field("keys", &self.keys.len())
            .finish()
    }
}

impl TokenFactory {
    /// Create a factory. `lifetime_secs` must be positive and the algorithm
    /// must be an RSA signature algorithm.
    pub fn new(
        keys: Arc<KeySet>,
        issuer: impl Into<String>,
        lifetime_secs: u64,
        algorithm: Algorithm,
    ) -> Result<Self, DomainError> {
        let issuer = issuer.into();
        if issuer.trim().is_empty() {
            return Err(DomainError::configuration("Issuer must not be empty"));
        }

        if lifetime_secs == 0 {
            return Err(DomainError::configuration("Token lifetime must be positive"));
        }
        let lifetime = i64::try_from(lifetime_secs)
            .ok()
            .and_then(Duration::try_seconds)
            .ok_or_else(|| DomainError::configuration("Token lifetime is out of range"))?;

        if !is_rsa_algorithm(algorithm) {
            return Err(DomainError::configuration(format!(
                "Unsupported signing algorithm {:?}; only RSA algorithms are supported",
                algorithm
            )));
        }

        Ok(Self {
            keys,
            issuer,
            lifetime,
            algorithm,
            clock: Arc::new(SystemClock),
            id_generator: Arc::new(UuidGenerator),
        })
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_id_generator(mut self, id_generator: Arc<dyn IdGenerator>) -> Self {
        self.id_generator = id_generator;
        self
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    pub fn lifetime(&self) -> Duration {
        self.lifetime
    }

    pub fn keys(&self) -> &Arc<KeySet> {
        &self.keys
    }

    /// Sign `claims` merged with `iss`, `jti`, `iat` and `exp`.
    ///
    /// Registered claims always replace caller values of the same name.
    pub fn mint(&self, claims: ClaimsSet) -> Result<SignedToken, DomainError> {
        let key = self.keys.signing_key(self.algorithm).ok_or_else(|| {
            DomainError::minting(format!(
                "No private signing key available for algorithm {:?}",
                self.algorithm
            ))
        })?;
        let encoding_key = key
            .encoding_key()
            .ok_or_else(|| DomainError::minting("Signing key has no private component"))?;

        let now = self.clock.now();
        let expires = now + self.lifetime;
        let jti = self.id_generator.generate();

        let mut claims = claims;
        claims.insert(ISSUER, self.issuer.clone());
        claims.insert(JWT_ID, jti.clone());
        claims.insert(ISSUED_AT, now.timestamp());
        claims.insert(EXPIRATION, expires.timestamp());

        let mut header = Header::new(self.algorithm);
        header.kid = Some(key.kid().to_string());

        let compact = encode(&header, &claims, encoding_key)
            .map_err(|e| DomainError::minting(format!("Failed to sign token: {}", e)))?;

        debug!(kid = key.kid(), jti = %jti, "Minted token");

        Ok(SignedToken::new(compact, header, claims))
    }

    /// Mint a token carrying only the registered claims
    pub fn mint_empty(&self) -> Result<SignedToken, DomainError> {
        self.mint(ClaimsSet::new())
    }
}
