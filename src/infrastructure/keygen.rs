//! RSA key store generation

use chrono::Utc;
use jsonwebtoken::Algorithm;
use rand::rngs::OsRng;
use rsa::pkcs8::{EncodePrivateKey, LineEnding};
use rsa::RsaPrivateKey;
use tracing::{info, warn};

use crate::domain::DomainError;
use crate::infrastructure::keystore::{KeyStoreType, PrivateJwk, PrivateJwkSet};

pub const SUPPORTED_KEY_WIDTHS: [usize; 3] = [1024, 2048, 4096];
pub const SUPPORTED_HASH_LENGTHS: [u16; 3] = [256, 384, 512];

/// What to generate
#[derive(Debug, Clone)]
pub struct KeygenOptions {
    pub key_width: usize,
    pub hash_length: u16,
    /// Defaults to today's date for JWKS output
    pub kid: Option<String>,
    pub format: KeyStoreType,
    /// Required for PKCS#8 output, the private key is always encrypted
    pub password: Option<String>,
}

impl Default for KeygenOptions {
    fn default() -> Self {
        Self {
            key_width: 2048,
            hash_length: 256,
            kid: None,
            format: KeyStoreType::Pkcs8,
            password: None,
        }
    }
}

impl KeygenOptions {
    pub fn algorithm(&self) -> Result<Algorithm, DomainError> {
        match self.hash_length {
            256 => Ok(Algorithm::RS256),
            384 => Ok(Algorithm::RS384),
            512 => Ok(Algorithm::RS512),
            other => Err(DomainError::configuration(format!(
                "Unsupported hash length {}; use one of {:?}",
                other, SUPPORTED_HASH_LENGTHS
            ))),
        }
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        if !SUPPORTED_KEY_WIDTHS.contains(&self.key_width) {
            return Err(DomainError::configuration(format!(
                "Unsupported key width {}; use one of {:?}",
                self.key_width, SUPPORTED_KEY_WIDTHS
            )));
        }

        self.algorithm()?;

        if self.format == KeyStoreType::Pkcs8
            && self.password.as_deref().is_none_or(str::is_empty)
        {
            return Err(DomainError::configuration(
                "A password is required to write a PKCS#8 key store",
            ));
        }

        Ok(())
    }

    /// Only JWKS output stores `alg` next to the key. A PKCS#8 key is signed
    /// with whatever `jwt.signing_algorithm` configures.
    pub fn records_algorithm(&self) -> bool {
        self.format == KeyStoreType::Jwks
    }

    fn kid_or_today(&self) -> String {
        self.kid
            .clone()
            .unwrap_or_else(|| Utc::now().format("%Y-%m-%d").to_string())
    }
}

/// Serialized key store ready to be written out
#[derive(Debug, Clone)]
pub struct GeneratedKeyStore {
    pub format: KeyStoreType,
    pub algorithm: Algorithm,
    pub kid: Option<String>,
    pub contents: Vec<u8>,
}

/// Generate a fresh RSA key and serialize it. Slow for wide keys, run off
/// the async executor.
pub fn generate(options: &KeygenOptions) -> Result<GeneratedKeyStore, DomainError> {
    options.validate()?;

    info!(bits = options.key_width, "Generating RSA key");
    let key = RsaPrivateKey::new(&mut OsRng, options.key_width)
        .map_err(|e| DomainError::internal(format!("RSA key generation failed: {}", e)))?;

    export(&key, options)
}

/// Serialize an existing key as a key store
pub fn export(key: &RsaPrivateKey, options: &KeygenOptions) -> Result<GeneratedKeyStore, DomainError> {
    options.validate()?;
    let algorithm = options.algorithm()?;

    match options.format {
        KeyStoreType::Pkcs8 => {
            if algorithm != Algorithm::RS256 {
                warn!(
                    ?algorithm,
                    "PKCS#8 key stores do not record the signing algorithm; set jwt.signing_algorithm \
                     to match or generate with --format jwks"
                );
            }

            let password = options.password.as_deref().unwrap_or_default();
            let pem = key
                .to_pkcs8_encrypted_pem(&mut OsRng, password, LineEnding::LF)
                .map_err(|e| DomainError::internal(format!("Failed to encrypt private key: {}", e)))?;

            Ok(GeneratedKeyStore {
                format: KeyStoreType::Pkcs8,
                algorithm,
                kid: None,
                contents: pem.as_bytes().to_vec(),
            })
        }
        KeyStoreType::Jwks => {
            let kid = options.kid_or_today();
            let document = PrivateJwkSet {
                keys: vec![PrivateJwk::from_private_key(Some(kid.clone()), Some(algorithm), key)],
            };
            let contents = serde_json::to_vec_pretty(&document)
                .map_err(|e| DomainError::internal(format!("Failed to serialize JWKS: {}", e)))?;

            Ok(GeneratedKeyStore {
                format: KeyStoreType::Jwks,
                algorithm,
                kid: Some(kid),
                contents,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::keystore::{jwks_store, pkcs8_store};
    use crate::test_support::rsa_key;

    #[test]
    fn test_only_jwks_records_algorithm() {
        let pkcs8 = KeygenOptions {
            hash_length: 512,
            password: Some("pw".to_string()),
            ..Default::default()
        };
        assert!(!pkcs8.records_algorithm());

        let store = export(rsa_key(), &pkcs8).unwrap();
        assert_eq!(store.algorithm, Algorithm::RS512);
        let keys = pkcs8_store::parse(&store.contents, "pw").unwrap();
        assert_eq!(keys.keys()[0].algorithm(), None);

        let jwks = KeygenOptions {
            hash_length: 512,
            format: KeyStoreType::Jwks,
            ..Default::default()
        };
        assert!(jwks.records_algorithm());

        let store = export(rsa_key(), &jwks).unwrap();
        let keys = jwks_store::parse(&store.contents).unwrap();
        assert_eq!(keys.keys()[0].algorithm(), Some(Algorithm::RS512));
    }

    #[test]
    fn test_validation() {
        let mut options = KeygenOptions {
            password: Some("pw".to_string()),
            ..Default::default()
        };
        assert!(options.validate().is_ok());

        options.key_width = 3072;
        assert!(options.validate().is_err());

        options.key_width = 4096;
        options.hash_length = 128;
        assert!(options.validate().is_err());

        options.hash_length = 512;
        options.password = None;
        assert!(options.validate().is_err());

        options.format = KeyStoreType::Jwks;
        assert!(options.validate().is_ok());
    }

    #[test]
    fn test_export_pkcs8() {
        let options = KeygenOptions {
            password: Some("changeit".to_string()),
            ..Default::default()
        };
        let store = export(rsa_key(), &options).unwrap();

        let keys = pkcs8_store::parse(&store.contents, "changeit").unwrap();
        assert!(keys.has_private_keys());
        assert!(pkcs8_store::parse(&store.contents, "wrong").is_err());
    }

    #[test]
    fn test_export_jwks_defaults_kid_to_today() {
        let options = KeygenOptions {
            hash_length: 384,
            format: KeyStoreType::Jwks,
            ..Default::default()
        };
        let store = export(rsa_key(), &options).unwrap();

        assert_eq!(store.algorithm, Algorithm::RS384);
        let keys = jwks_store::parse(&store.contents).unwrap();
        let key = keys.keys().first().unwrap();
        assert_eq!(key.algorithm(), Some(Algorithm::RS384));
        assert_eq!(store.kid.as_deref(), Some(key.kid()));
        assert!(chrono::NaiveDate::parse_from_str(key.kid(), "%Y-%m-%d").is_ok());
    }
}
