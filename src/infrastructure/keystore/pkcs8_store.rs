//! PKCS#8 key stores (PEM bundle or single DER document)

use rsa::pkcs1::DecodeRsaPrivateKey;
use rsa::pkcs8::{DecodePrivateKey, DecodePublicKey};
use rsa::{RsaPrivateKey, RsaPublicKey};

use crate::domain::{DomainError, Jwk, KeySet};

const ENCRYPTED_PRIVATE_KEY: &str = "ENCRYPTED PRIVATE KEY";
const PRIVATE_KEY: &str = "PRIVATE KEY";
const RSA_PRIVATE_KEY: &str = "RSA PRIVATE KEY";
const PUBLIC_KEY: &str = "PUBLIC KEY";

/// Decode a PKCS#8 key store. Encrypted keys are decrypted with `password`;
/// key ids are RFC 7638 thumbprints.
pub fn parse(bytes: &[u8], password: &str) -> Result<KeySet, DomainError> {
    let keys = if is_pem(bytes) {
        let blocks = pem::parse_many(bytes)
            .map_err(|e| DomainError::key_store(format!("Invalid PEM key store: {}", e)))?;

        if blocks.is_empty() {
            return Err(DomainError::key_store("PEM key store contains no keys"));
        }

        blocks
            .iter()
            .map(|block| decode_block(block.tag(), block.contents(), password))
            .collect::<Result<Vec<_>, _>>()?
    } else {
        vec![decode_der(bytes, password)?]
    };

    KeySet::new(keys)
}

fn is_pem(bytes: &[u8]) -> bool {
    std::str::from_utf8(bytes)
        .map(|text| text.contains("-----BEGIN "))
        .unwrap_or(false)
}

fn decode_block(tag: &str, der: &[u8], password: &str) -> Result<Jwk, DomainError> {
    match tag {
        ENCRYPTED_PRIVATE_KEY => {
            let key = RsaPrivateKey::from_pkcs8_encrypted_der(der, password).map_err(|e| {
                DomainError::key_store(format!("Failed to decrypt private key: {}", e))
            })?;
            Jwk::from_private_key(None, key)
        }
        PRIVATE_KEY => {
            let key = RsaPrivateKey::from_pkcs8_der(der)
                .map_err(|e| DomainError::key_store(format!("Invalid PKCS#8 private key: {}", e)))?;
            Jwk::from_private_key(None, key)
        }
        RSA_PRIVATE_KEY => {
            let key = RsaPrivateKey::from_pkcs1_der(der)
                .map_err(|e| DomainError::key_store(format!("Invalid PKCS#1 private key: {}", e)))?;
            Jwk::from_private_key(None, key)
        }
        PUBLIC_KEY => {
            let key = RsaPublicKey::from_public_key_der(der)
                .map_err(|e| DomainError::key_store(format!("Invalid public key: {}", e)))?;
            Jwk::from_public_key(None, key)
        }
        other => Err(DomainError::key_store(format!(
            "Unsupported PEM block '{}' in key store",
            other
        ))),
    }
}

fn decode_der(der: &[u8], password: &str) -> Result<Jwk, DomainError> {
    if let Ok(key) = RsaPrivateKey::from_pkcs8_encrypted_der(der, password) {
        return Jwk::from_private_key(None, key);
    }

    RsaPrivateKey::from_pkcs8_der(der)
        .map_err(|e| {
            DomainError::key_store(format!(
                "Data is not a valid PKCS#8 key store ({} bytes): {}",
                der.len(),
                e
            ))
        })
        .and_then(|key| Jwk::from_private_key(None, key))
}
