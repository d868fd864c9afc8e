//! Token verification in three stages: parse, signature, claims
//!
//! Every stage returns `Result<_, TokenRejection>`. Callers on the request
//! path collapse any rejection to "no usable token"; the reason is only
//! kept for logging.

use std::collections::HashSet;
use std::fmt::Debug;
use std::sync::Arc;

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, decode_header, Algorithm, Header, Validation};
use thiserror::Error;

use super::clock::{Clock, SystemClock};
use crate::domain::jwk::is_rsa_algorithm;
use crate::domain::token::{EXPIRATION, ISSUED_AT, JWT_ID};
use crate::domain::{ClaimsSet, DomainError, KeySet};

const EXPECTED_TYPE: &str = "JWT";

/// Why a token was not accepted
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenRejection {
    #[error("token is not a well-formed JWS")]
    Malformed,
    #[error("unsupported token type '{0}'")]
    UnsupportedType(String),
    #[error("token algorithm {0:?} does not match the configured algorithm")]
    AlgorithmMismatch(Algorithm),
    #[error("no verification key matches the token")]
    NoMatchingKey,
    #[error("signature verification failed")]
    InvalidSignature,
    #[error("issuer '{0}' does not match")]
    IssuerMismatch(String),
    #[error("required claim '{0}' is missing")]
    MissingClaim(&'static str),
    #[error("token expired at {0}")]
    Expired(i64),
}

/// Verifies compact tokens against a public key set
#[derive(Clone)]
pub struct TokenVerifier {
    keys: Arc<KeySet>,
    issuer: String,
    algorithm: Algorithm,
    clock: Arc<dyn Clock>,
    enforce_expiry: bool,
    leeway_secs: i64,
}

impl Debug for TokenVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenVerifier")
            .field("issuer", &self.issuer)
            .field("algorithm", &self.algorithm)
            .field("keys", &self.keys.len())
            .field("enforce_expiry", &self.enforce_expiry)
            .field("leeway_secs", &self.leeway_secs)
            .finish()
    }
}

impl TokenVerifier {
    /// Only the public projection of `keys` is retained.
    pub fn new(keys: &KeySet, issuer: impl Into<String>, algorithm: Algorithm) -> Result<Self, DomainError> {
        let issuer = issuer.into();
        if issuer.trim().is_empty() {
            return Err(DomainError::configuration("Issuer must not be empty"));
        }

        if !is_rsa_algorithm(algorithm) {
            return Err(DomainError::configuration(format!(
                "Unsupported verification algorithm {:?}",
                algorithm
            )));
        }

        if keys.is_empty() {
            return Err(DomainError::configuration("Verification key set is empty"));
        }

        Ok(Self {
            keys: Arc::new(keys.to_public()),
            issuer,
            algorithm,
            clock: Arc::new(SystemClock),
            enforce_expiry: true,
            leeway_secs: 0,
        })
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Turn `exp` enforcement on or off, with a tolerance in seconds
    pub fn with_expiry(mut self, enforce: bool, leeway_secs: u64) -> Self {
        self.enforce_expiry = enforce;
        self.leeway_secs = i64::try_from(leeway_secs).unwrap_or(i64::MAX);
        self
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    /// Run all stages and return the verified claims
    pub fn verify(&self, token: &str) -> Result<ClaimsSet, TokenRejection> {
        let header = self.parse(token)?;
        let claims = self.verify_signature(token, &header)?;
        self.verify_claims(claims)
    }

    /// Decode the header and check its type and algorithm
    pub fn parse(&self, token: &str) -> Result<Header, TokenRejection> {
        if token.split('.').count() != 3 {
            return Err(TokenRejection::Malformed);
        }

        let header = decode_header(token).map_err(|_| TokenRejection::Malformed)?;

        if let Some(typ) = header.typ.as_deref() {
            if !typ.eq_ignore_ascii_case(EXPECTED_TYPE) {
                return Err(TokenRejection::UnsupportedType(typ.to_string()));
            }
        }

        if header.alg != self.algorithm {
            return Err(TokenRejection::AlgorithmMismatch(header.alg));
        }

        Ok(header)
    }

    /// Check the signature with the candidate keys and decode the payload
    pub fn verify_signature(&self, token: &str, header: &Header) -> Result<ClaimsSet, TokenRejection> {
        let mut validation = Validation::new(self.algorithm);
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.validate_aud = false;
        validation.required_spec_claims = HashSet::new();

        let mut rejection = TokenRejection::NoMatchingKey;

        for key in self.keys.verification_keys(self.algorithm, header.kid.as_deref()) {
            match decode::<ClaimsSet>(token, key.decoding_key(), &validation) {
                Ok(data) => return Ok(data.claims),
                Err(e) => {
                    rejection = match e.kind() {
                        ErrorKind::InvalidSignature => TokenRejection::InvalidSignature,
                        _ => TokenRejection::Malformed,
                    };
                }
            }
        }

        Err(rejection)
    }

    /// Issuer equality, presence of `iat`/`exp`/`jti`, then expiry
    pub fn verify_claims(&self, claims: ClaimsSet) -> Result<ClaimsSet, TokenRejection> {
        match claims.issuer() {
            Some(issuer) if issuer == self.issuer => {}
            Some(other) => return Err(TokenRejection::IssuerMismatch(other.to_string())),
            None => return Err(TokenRejection::IssuerMismatch(String::new())),
        }

        for name in [ISSUED_AT, EXPIRATION, JWT_ID] {
            if !claims.contains(name) {
                return Err(TokenRejection::MissingClaim(name));
            }
        }

        if self.enforce_expiry {
            let exp = claims
                .expiration()
                .ok_or(TokenRejection::MissingClaim(EXPIRATION))?;
            let now = self.clock.timestamp();

            if exp.saturating_add(self.leeway_secs) <= now {
                return Err(TokenRejection::Expired(exp));
            }
        }

        Ok(claims)
    }
}
