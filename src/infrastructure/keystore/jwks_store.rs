//! JSON Web Key Set key stores with private RSA parameters

use std::str::FromStr;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use jsonwebtoken::Algorithm;
use rsa::traits::{PrivateKeyParts, PublicKeyParts};
use rsa::{BigUint, RsaPrivateKey, RsaPublicKey};
use serde::{Deserialize, Serialize};

use crate::domain::{DomainError, Jwk, KeySet, KeyUse};

/// JWK with every RSA parameter, public and private
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PrivateJwk {
    /// Key type (only RSA is supported)
    pub kty: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kid: Option<String>,
    #[serde(rename = "use", skip_serializing_if = "Option::is_none")]
    pub key_use: Option<KeyUse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alg: Option<String>,
    /// RSA modulus (base64url)
    pub n: String,
    /// RSA public exponent (base64url)
    pub e: String,
    /// RSA private exponent (base64url)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub d: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub p: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub q: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dp: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dq: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qi: Option<String>,
}

impl PrivateJwk {
    /// Full private JWK for an RSA key
    pub fn from_private_key(kid: Option<String>, alg: Option<Algorithm>, key: &RsaPrivateKey) -> Self {
        let primes = key.primes();

        Self {
            kty: "RSA".to_string(),
            kid,
            key_use: Some(KeyUse::Signature),
            alg: alg.map(|a| format!("{:?}", a)),
            n: encode(&key.n().to_bytes_be()),
            e: encode(&key.e().to_bytes_be()),
            d: Some(encode(&key.d().to_bytes_be())),
            p: primes.first().map(|p| encode(&p.to_bytes_be())),
            q: primes.get(1).map(|q| encode(&q.to_bytes_be())),
            dp: key.dp().map(|v| encode(&v.to_bytes_be())),
            dq: key.dq().map(|v| encode(&v.to_bytes_be())),
            qi: key.qinv().map(|v| encode(&v.to_bytes_be().1)),
        }
    }

    fn into_jwk(self) -> Result<Jwk, DomainError> {
        if self.kty != "RSA" {
            return Err(DomainError::configuration(format!(
                "Unsupported key type: {}. Only RSA keys are supported.",
                self.kty
            )));
        }

        let algorithm = self
            .alg
            .as_deref()
            .map(|alg| {
                Algorithm::from_str(alg)
                    .map_err(|_| DomainError::configuration(format!("Unsupported algorithm: {}", alg)))
            })
            .transpose()?;

        let n = BigUint::from_bytes_be(&decode(&self.n, "n")?);
        let e = BigUint::from_bytes_be(&decode(&self.e, "e")?);

        let jwk = match &self.d {
            Some(d) => {
                let d = BigUint::from_bytes_be(&decode(d, "d")?);
                let primes = match (&self.p, &self.q) {
                    (Some(p), Some(q)) => vec![
                        BigUint::from_bytes_be(&decode(p, "p")?),
                        BigUint::from_bytes_be(&decode(q, "q")?),
                    ],
                    // primes are recovered from (n, e, d)
                    _ => vec![],
                };

                let key = RsaPrivateKey::from_components(n, e, d, primes)
                    .map_err(|e| DomainError::key_store(format!("Invalid RSA key components: {}", e)))?;
                key.validate()
                    .map_err(|e| DomainError::key_store(format!("Invalid RSA key: {}", e)))?;

                Jwk::from_private_key(self.kid, key)?
            }
            None => {
                let key = RsaPublicKey::new(n, e)
                    .map_err(|e| DomainError::key_store(format!("Invalid RSA public key: {}", e)))?;
                Jwk::from_public_key(self.kid, key)?
            }
        };

        Ok(jwk.with_use(self.key_use).with_algorithm(algorithm))
    }
}

/// `{"keys": [...]}` document that may carry private parameters
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PrivateJwkSet {
    pub keys: Vec<PrivateJwk>,
}

/// Decode a JWKS key store
pub fn parse(bytes: &[u8]) -> Result<KeySet, DomainError> {
    let document: PrivateJwkSet = serde_json::from_slice(bytes)
        .map_err(|e| DomainError::key_store(format!("Failed to parse JWKS key store: {}", e)))?;

    if document.keys.is_empty() {
        return Err(DomainError::key_store("JWKS contains no keys"));
    }

    let keys = document
        .keys
        .into_iter()
        .map(PrivateJwk::into_jwk)
        .collect::<Result<Vec<_>, _>>()?;

    KeySet::new(keys)
}

fn encode(bytes: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(bytes)
}

fn decode(s: &str, field: &str) -> Result<Vec<u8>, DomainError> {
    URL_SAFE_NO_PAD
        .decode(s)
        .map_err(|e| DomainError::key_store(format!("Invalid base64url in '{}': {}", field, e)))
}
