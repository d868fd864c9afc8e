//! A single RSA JSON Web Key with optional private material

use std::fmt::Debug;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey};
use rsa::pkcs1::EncodeRsaPrivateKey;
use rsa::traits::PublicKeyParts;
use rsa::{RsaPrivateKey, RsaPublicKey};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::domain::DomainError;

/// Smallest accepted RSA modulus, in bits
pub const MIN_RSA_KEY_BITS: usize = 1024;

/// Intended use of a key (`use` member of a JWK)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeyUse {
    #[serde(rename = "sig")]
    Signature,
    #[serde(rename = "enc")]
    Encryption,
}

/// Whether the algorithm is one of the RSA signature algorithms
pub fn is_rsa_algorithm(algorithm: Algorithm) -> bool {
    matches!(
        algorithm,
        Algorithm::RS256
            | Algorithm::RS384
            | Algorithm::RS512
            | Algorithm::PS256
            | Algorithm::PS384
            | Algorithm::PS512
    )
}

/// An RSA key pair (or public key) tagged with a key id, use and algorithm
#[derive(Clone)]
pub struct Jwk {
    kid: String,
    key_use: Option<KeyUse>,
    algorithm: Option<Algorithm>,
    public_key: RsaPublicKey,
    private_key: Option<RsaPrivateKey>,
    decoding_key: DecodingKey,
    encoding_key: Option<EncodingKey>,
}

impl Debug for Jwk {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Jwk")
            .field("kid", &self.kid)
            .field("key_use", &self.key_use)
            .field("algorithm", &self.algorithm)
            .field("bits", &self.bits())
            .field("private_key", &self.private_key.as_ref().map(|_| "[hidden]"))
            .finish()
    }
}

impl Jwk {
    /// Build a signing-capable key from an RSA private key.
    ///
    /// When `kid` is `None` the RFC 7638 thumbprint is used.
    pub fn from_private_key(
        kid: Option<String>,
        private_key: RsaPrivateKey,
    ) -> Result<Self, DomainError> {
        let der = private_key
            .to_pkcs1_der()
            .map_err(|e| DomainError::key_store(format!("Failed to encode RSA private key: {}", e)))?;
        let encoding_key = EncodingKey::from_rsa_der(der.as_bytes());

        let mut jwk = Self::from_public_key(kid, private_key.to_public_key())?;
        jwk.private_key = Some(private_key);
        jwk.encoding_key = Some(encoding_key);
        Ok(jwk)
    }

    /// Build a verification-only key from an RSA public key
    pub fn from_public_key(kid: Option<String>, public_key: RsaPublicKey) -> Result<Self, DomainError> {
        let bits = public_key.size() * 8;
        if bits < MIN_RSA_KEY_BITS {
            return Err(DomainError::configuration(format!(
                "RSA key is {} bits wide, at least {} required",
                bits, MIN_RSA_KEY_BITS
            )));
        }

        let n = encode_component(&public_key.n().to_bytes_be());
        let e = encode_component(&public_key.e().to_bytes_be());

        let decoding_key = DecodingKey::from_rsa_components(&n, &e)
            .map_err(|e| DomainError::key_store(format!("Failed to create decoding key: {}", e)))?;

        let kid = kid.unwrap_or_else(|| thumbprint(&n, &e));

        Ok(Self {
            kid,
            key_use: Some(KeyUse::Signature),
            algorithm: None,
            public_key,
            private_key: None,
            decoding_key,
            encoding_key: None,
        })
    }

    /// Set the declared use
    pub fn with_use(mut self, key_use: Option<KeyUse>) -> Self {
        self.key_use = key_use;
        self
    }

    /// Pin the key to a single algorithm
    pub fn with_algorithm(mut self, algorithm: Option<Algorithm>) -> Self {
        self.algorithm = algorithm;
        self
    }

    pub fn kid(&self) -> &str {
        &self.kid
    }

    pub fn key_use(&self) -> Option<KeyUse> {
        self.key_use
    }

    pub fn algorithm(&self) -> Option<Algorithm> {
        self.algorithm
    }

    pub fn public_key(&self) -> &RsaPublicKey {
        &self.public_key
    }

    pub fn private_key(&self) -> Option<&RsaPrivateKey> {
        self.private_key.as_ref()
    }

    pub fn has_private_key(&self) -> bool {
        self.private_key.is_some()
    }

    pub fn bits(&self) -> usize {
        self.public_key.size() * 8
    }

    pub(crate) fn decoding_key(&self) -> &DecodingKey {
        &self.decoding_key
    }

    pub(crate) fn encoding_key(&self) -> Option<&EncodingKey> {
        self.encoding_key.as_ref()
    }

    /// Usable for signatures with the given algorithm (ignores private material)
    pub fn supports(&self, algorithm: Algorithm) -> bool {
        is_rsa_algorithm(algorithm)
            && matches!(self.key_use, None | Some(KeyUse::Signature))
            && self.algorithm.is_none_or(|alg| alg == algorithm)
    }

    /// Copy of this key with every private component dropped
    pub fn to_public(&self) -> Self {
        Self {
            kid: self.kid.clone(),
            key_use: self.key_use,
            algorithm: self.algorithm,
            public_key: self.public_key.clone(),
            private_key: None,
            decoding_key: self.decoding_key.clone(),
            encoding_key: None,
        }
    }

    /// Public JSON representation
    pub fn to_public_jwk(&self) -> PublicJwk {
        PublicJwk {
            kty: "RSA".to_string(),
            kid: self.kid.clone(),
            key_use: self.key_use,
            alg: self.algorithm,
            n: encode_component(&self.public_key.n().to_bytes_be()),
            e: encode_component(&self.public_key.e().to_bytes_be()),
        }
    }
}

/// Wire shape of a published key. Carries public parameters only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicJwk {
    pub kty: String,
    pub kid: String,
    #[serde(rename = "use", skip_serializing_if = "Option::is_none")]
    pub key_use: Option<KeyUse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alg: Option<Algorithm>,
    pub n: String,
    pub e: String,
}

fn encode_component(bytes: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(bytes)
}

/// RFC 7638 JWK thumbprint of an RSA key (SHA-256, base64url)
pub fn thumbprint(n: &str, e: &str) -> String {
    // members in lexicographic order, no whitespace
    let canonical = format!(r#"{{"e":"{}","kty":"RSA","n":"{}"}}"#, e, n);
    URL_SAFE_NO_PAD.encode(Sha256::digest(canonical.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{rsa_key, second_rsa_key};

    #[test]
    fn test_private_key_defaults_to_thumbprint_kid() {
        let jwk = Jwk::from_private_key(None, rsa_key().clone()).unwrap();
        let public = jwk.to_public_jwk();

        assert_eq!(jwk.kid(), thumbprint(&public.n, &public.e));
        assert!(jwk.has_private_key());
        assert!(jwk.encoding_key().is_some());
        assert_eq!(jwk.key_use(), Some(KeyUse::Signature));
    }

    #[test]
    fn test_thumbprint_is_stable_per_key() {
        let a = Jwk::from_private_key(None, rsa_key().clone()).unwrap();
        let b = Jwk::from_public_key(None, rsa_key().to_public_key()).unwrap();
        let c = Jwk::from_private_key(None, second_rsa_key().clone()).unwrap();

        assert_eq!(a.kid(), b.kid());
        assert_ne!(a.kid(), c.kid());
    }

    #[test]
    fn test_to_public_drops_private_material() {
        let jwk = Jwk::from_private_key(Some("k1".to_string()), rsa_key().clone()).unwrap();
        let public = jwk.to_public();

        assert_eq!(public.kid(), "k1");
        assert!(!public.has_private_key());
        assert!(public.encoding_key().is_none());
    }

    #[test]
    fn test_supports_respects_pinned_algorithm_and_use() {
        let jwk = Jwk::from_private_key(Some("k1".to_string()), rsa_key().clone())
            .unwrap()
            .with_algorithm(Some(Algorithm::RS384));

        assert!(jwk.supports(Algorithm::RS384));
        assert!(!jwk.supports(Algorithm::RS256));
        assert!(!jwk.supports(Algorithm::HS256));

        let enc = jwk.with_algorithm(None).with_use(Some(KeyUse::Encryption));
        assert!(!enc.supports(Algorithm::RS256));
    }

    #[test]
    fn test_public_jwk_serialization() {
        let jwk = Jwk::from_private_key(Some("k1".to_string()), rsa_key().clone())
            .unwrap()
            .with_algorithm(Some(Algorithm::RS256));
        let json = serde_json::to_value(jwk.to_public_jwk()).unwrap();

        assert_eq!(json["kty"], "RSA");
        assert_eq!(json["kid"], "k1");
        assert_eq!(json["use"], "sig");
        assert_eq!(json["alg"], "RS256");
        assert_eq!(json["e"], "AQAB");
        assert!(json.get("d").is_none());
    }

    #[test]
    fn test_debug_hides_private_key() {
        let jwk = Jwk::from_private_key(Some("k1".to_string()), rsa_key().clone()).unwrap();
        let debug = format!("{:?}", jwk);

        assert!(debug.contains("[hidden]"));
        assert!(debug.contains("k1"));
    }
}
