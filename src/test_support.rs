//! Shared fixtures for unit tests
//!
//! RSA key generation is slow in debug builds, so the keys are generated
//! once per test binary.

use std::sync::Arc;

use jsonwebtoken::Algorithm;
use once_cell::sync::Lazy;
use rand::rngs::OsRng;
use rsa::RsaPrivateKey;

use crate::domain::{Jwk, KeySet};
use crate::infrastructure::auth::{FixedClock, SequentialIdGenerator, TokenFactory};

pub const TEST_ISSUER: &str = "https://issuer.test";
pub const TEST_NOW: i64 = 1_700_000_000;

static RSA_KEY: Lazy<RsaPrivateKey> =
    Lazy::new(|| RsaPrivateKey::new(&mut OsRng, 2048).expect("generate test key"));

static SECOND_RSA_KEY: Lazy<RsaPrivateKey> =
    Lazy::new(|| RsaPrivateKey::new(&mut OsRng, 2048).expect("generate test key"));

pub fn rsa_key() -> &'static RsaPrivateKey {
    &RSA_KEY
}

pub fn second_rsa_key() -> &'static RsaPrivateKey {
    &SECOND_RSA_KEY
}

/// Key set holding the primary test key under kid `test-key`
pub fn key_set() -> KeySet {
    let jwk = Jwk::from_private_key(Some("test-key".to_string()), rsa_key().clone()).unwrap();
    KeySet::new(vec![jwk]).unwrap()
}

/// Key set holding the second test key under kid `other-key`
pub fn other_key_set() -> KeySet {
    let jwk =
        Jwk::from_private_key(Some("other-key".to_string()), second_rsa_key().clone()).unwrap();
    KeySet::new(vec![jwk]).unwrap()
}

/// RS256 factory over [`key_set`] with a frozen clock at [`TEST_NOW`]
pub fn factory() -> TokenFactory {
    factory_with(key_set())
}

pub fn factory_with(keys: KeySet) -> TokenFactory {
    TokenFactory::new(Arc::new(keys), TEST_ISSUER, 3600, Algorithm::RS256)
        .unwrap()
        .with_clock(Arc::new(FixedClock::new(TEST_NOW)))
        .with_id_generator(Arc::new(SequentialIdGenerator::default()))
}
