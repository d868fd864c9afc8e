//! Shared JWT objects built from configuration

use std::sync::Arc;

use tokio::sync::OnceCell;
use tracing::info;

use super::clock::{Clock, IdGenerator, SystemClock, UuidGenerator};
use super::factory::TokenFactory;
use super::verifier::TokenVerifier;
use crate::config::JwtSettings;
use crate::domain::{DomainError, KeySet};
use crate::infrastructure::keystore::{KeyStoreLoader, ProviderRegistry};

/// Owns the JWT settings and builds the key set and token factory once.
///
/// Concurrent first callers of [`JwtBundle::key_set`] or
/// [`JwtBundle::token_factory`] wait on the same load.
#[derive(Debug)]
pub struct JwtBundle {
    settings: JwtSettings,
    loader: KeyStoreLoader,
    clock: Arc<dyn Clock>,
    id_generator: Arc<dyn IdGenerator>,
    keys: OnceCell<Arc<KeySet>>,
    factory: OnceCell<TokenFactory>,
}

impl JwtBundle {
    /// Validate the settings; key material is loaded on first use
    pub fn new(settings: JwtSettings) -> Result<Self, DomainError> {
        settings.check()?;
        settings.algorithm()?;

        let loader = KeyStoreLoader::new(ProviderRegistry::new(), settings.resource_dirs.clone());

        Ok(Self {
            settings,
            loader,
            clock: Arc::new(SystemClock),
            id_generator: Arc::new(UuidGenerator),
            keys: OnceCell::new(),
            factory: OnceCell::new(),
        })
    }

    pub fn with_loader(mut self, loader: KeyStoreLoader) -> Self {
        self.loader = loader;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_id_generator(mut self, id_generator: Arc<dyn IdGenerator>) -> Self {
        self.id_generator = id_generator;
        self
    }

    pub fn settings(&self) -> &JwtSettings {
        &self.settings
    }

    pub fn clock(&self) -> Arc<dyn Clock> {
        self.clock.clone()
    }

    /// The full key set, private material included
    pub async fn key_set(&self) -> Result<Arc<KeySet>, DomainError> {
        self.keys
            .get_or_try_init(|| async {
                let keys = self
                    .loader
                    .load(
                        &self.settings.key_store_path,
                        &self.settings.key_store_password,
                        self.settings.key_store_type,
                        self.settings.key_store_provider.as_deref(),
                    )
                    .await?;

                if keys.is_empty() {
                    return Err(DomainError::configuration("Key store contains no keys"));
                }

                // keys without an `alg` are pinned to the configured algorithm
                let algorithm = self.settings.algorithm()?;
                let keys = KeySet::new(
                    keys.keys()
                        .iter()
                        .cloned()
                        .map(|key| match key.algorithm() {
                            Some(_) => key,
                            None => key.with_algorithm(Some(algorithm)),
                        })
                        .collect(),
                )?;

                Ok(Arc::new(keys))
            })
            .await
            .cloned()
    }

    /// Key set safe to publish
    pub async fn public_key_set(&self) -> Result<KeySet, DomainError> {
        Ok(self.key_set().await?.to_public())
    }

    pub async fn token_factory(&self) -> Result<&TokenFactory, DomainError> {
        self.factory
            .get_or_try_init(|| async {
                let keys = self.key_set().await?;
                let factory = TokenFactory::new(
                    keys,
                    self.settings.issuer.clone(),
                    self.settings.token_lifetime_secs,
                    self.settings.algorithm()?,
                )?
                .with_clock(self.clock.clone())
                .with_id_generator(self.id_generator.clone());

                info!(
                    issuer = %self.settings.issuer,
                    algorithm = ?factory.algorithm(),
                    "Token factory ready"
                );

                Ok(factory)
            })
            .await
    }

    /// A verifier over the public projection of the key set
    pub async fn verifier(&self) -> Result<TokenVerifier, DomainError> {
        let keys = self.key_set().await?;

        Ok(
            TokenVerifier::new(&keys, self.settings.issuer.clone(), self.settings.algorithm()?)?
                .with_clock(self.clock.clone())
                .with_expiry(self.settings.enforce_expiry, self.settings.expiry_leeway_secs),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::keystore::{KeyStoreType, PrivateJwk, PrivateJwkSet};
    use crate::test_support::{rsa_key, TEST_ISSUER};
    use jsonwebtoken::Algorithm;
    use rsa::pkcs8::{EncodePrivateKey, LineEnding};
    use tempfile::TempDir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn write_jwks(dir: &TempDir) -> String {
        let jwk = PrivateJwk::from_private_key(Some("bundle-key".to_string()), None, rsa_key());
        let path = dir.path().join("keys.jwks");
        std::fs::write(&path, serde_json::to_vec(&PrivateJwkSet { keys: vec![jwk] }).unwrap())
            .unwrap();
        path.to_string_lossy().into_owned()
    }

    fn settings(path: String) -> JwtSettings {
        let mut settings = JwtSettings::new(path, "unused", TEST_ISSUER);
        settings.key_store_type = KeyStoreType::Jwks;
        settings
    }

    #[tokio::test]
    async fn test_key_store_is_loaded_once() {
        let jwk = PrivateJwk::from_private_key(Some("bundle-key".to_string()), None, rsa_key());
        let body = serde_json::to_vec(&PrivateJwkSet { keys: vec![jwk] }).unwrap();

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/keys.jwks"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(body))
            .expect(1)
            .mount(&server)
            .await;

        let bundle = Arc::new(
            JwtBundle::new(settings(format!("{}/keys.jwks", server.uri()))).unwrap(),
        );

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let bundle = bundle.clone();
                tokio::spawn(async move {
                    if i % 2 == 0 {
                        bundle.token_factory().await.map(|_| ())
                    } else {
                        bundle.key_set().await.map(|_| ())
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.await.unwrap().unwrap();
        }
        assert!(bundle.verifier().await.is_ok());

        server.verify().await;
    }

    #[tokio::test]
    async fn test_keys_without_algorithm_get_the_configured_one() {
        let dir = TempDir::new().unwrap();
        let pem = rsa_key().to_pkcs8_pem(LineEnding::LF).unwrap();
        let path = dir.path().join("keys.pem");
        std::fs::write(&path, pem.as_bytes()).unwrap();

        let mut settings = JwtSettings::new(path.to_string_lossy(), "unused", TEST_ISSUER);
        settings.signing_algorithm = "RS384".to_string();
        let bundle = JwtBundle::new(settings).unwrap();

        let keys = bundle.key_set().await.unwrap();
        assert_eq!(keys.keys()[0].algorithm(), Some(Algorithm::RS384));

        let token = bundle.token_factory().await.unwrap().mint_empty().unwrap();
        assert_eq!(token.header().alg, Algorithm::RS384);
    }

    #[tokio::test]
    async fn test_pinned_algorithm_is_kept() {
        let jwk = PrivateJwk::from_private_key(
            Some("pinned".to_string()),
            Some(Algorithm::RS512),
            rsa_key(),
        );
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("keys.jwks");
        std::fs::write(&path, serde_json::to_vec(&PrivateJwkSet { keys: vec![jwk] }).unwrap()).unwrap();

        let bundle = JwtBundle::new(settings(path.to_string_lossy().into_owned())).unwrap();
        let keys = bundle.key_set().await.unwrap();
        assert_eq!(keys.keys()[0].algorithm(), Some(Algorithm::RS512));
    }

    #[tokio::test]
    async fn test_mint_and_verify_through_bundle() {
        let dir = TempDir::new().unwrap();
        let bundle = JwtBundle::new(settings(write_jwks(&dir))).unwrap();

        let token = bundle.token_factory().await.unwrap().mint_empty().unwrap();
        let verifier = bundle.verifier().await.unwrap();

        assert!(verifier.verify(token.serialize()).is_ok());
        assert_eq!(token.kid(), Some("bundle-key"));
        assert!(!bundle.public_key_set().await.unwrap().has_private_keys());
    }

    #[test]
    fn test_invalid_settings_rejected_eagerly() {
        let mut settings = settings("keys.jwks".to_string());
        settings.issuer = String::new();

        assert!(matches!(
            JwtBundle::new(settings).unwrap_err(),
            DomainError::Configuration { .. }
        ));
    }

    #[tokio::test]
    async fn test_missing_key_store() {
        let bundle = JwtBundle::new(settings("/definitely/missing/keys.jwks!".to_string())).unwrap();
        assert!(bundle.token_factory().await.unwrap_err().is_key_store());
    }
}
