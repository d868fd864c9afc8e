//! Key store types and the providers able to decode them

use std::fmt::{self, Debug};
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::{jwks_store, pkcs8_store};
use crate::domain::{DomainError, KeySet};

/// Name of the built-in provider
pub const DEFAULT_PROVIDER: &str = "rustcrypto";

/// On-disk format of a key store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyStoreType {
    /// PEM or DER PKCS#8, private keys optionally encrypted with the store password
    #[default]
    Pkcs8,
    /// RFC 7517 JSON Web Key Set with private parameters
    Jwks,
}

impl fmt::Display for KeyStoreType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pkcs8 => write!(f, "pkcs8"),
            Self::Jwks => write!(f, "jwks"),
        }
    }
}

impl FromStr for KeyStoreType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pkcs8" | "pem" => Ok(Self::Pkcs8),
            "jwks" | "jwk" => Ok(Self::Jwks),
            other => Err(DomainError::configuration(format!(
                "Unknown key store type '{}'. Use pkcs8 or jwks.",
                other
            ))),
        }
    }
}

/// Decodes raw key store bytes into a key set
pub trait KeyStoreProvider: Send + Sync + Debug {
    fn name(&self) -> &str;

    fn supports(&self, store_type: KeyStoreType) -> bool;

    fn load(
        &self,
        store_type: KeyStoreType,
        bytes: &[u8],
        password: &str,
    ) -> Result<KeySet, DomainError>;
}

/// Built-in provider backed by the RustCrypto `rsa`/`pkcs8` crates
#[derive(Debug, Clone, Copy, Default)]
pub struct RustCryptoProvider;

impl KeyStoreProvider for RustCryptoProvider {
    fn name(&self) -> &str {
        DEFAULT_PROVIDER
    }

    fn supports(&self, _store_type: KeyStoreType) -> bool {
        true
    }

    fn load(
        &self,
        store_type: KeyStoreType,
        bytes: &[u8],
        password: &str,
    ) -> Result<KeySet, DomainError> {
        match store_type {
            KeyStoreType::Pkcs8 => pkcs8_store::parse(bytes, password),
            KeyStoreType::Jwks => jwks_store::parse(bytes),
        }
    }
}

/// Named providers; the first registered one is the default
#[derive(Debug, Clone)]
pub struct ProviderRegistry {
    providers: Vec<Arc<dyn KeyStoreProvider>>,
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ProviderRegistry {
    /// Registry holding only the built-in provider
    pub fn new() -> Self {
        Self {
            providers: vec![Arc::new(RustCryptoProvider)],
        }
    }

    pub fn register(&mut self, provider: Arc<dyn KeyStoreProvider>) {
        self.providers.push(provider);
    }

    pub fn with_provider(mut self, provider: Arc<dyn KeyStoreProvider>) -> Self {
        self.register(provider);
        self
    }

    /// Pick a provider for the store type.
    ///
    /// A requested provider that is unknown or cannot read this type is not
    /// fatal: the default provider for the type is used and a warning logged.
    pub fn resolve(
        &self,
        store_type: KeyStoreType,
        requested: Option<&str>,
    ) -> Result<Arc<dyn KeyStoreProvider>, DomainError> {
        if let Some(name) = requested {
            let found = self
                .providers
                .iter()
                .find(|p| p.name().eq_ignore_ascii_case(name) && p.supports(store_type));

            if let Some(provider) = found {
                return Ok(provider.clone());
            }

            warn!(
                provider = name,
                store_type = %store_type,
                "Key store provider unavailable, falling back to default provider"
            );
        }

        self.providers
            .iter()
            .find(|p| p.supports(store_type))
            .cloned()
            .ok_or_else(|| {
                DomainError::configuration(format!("No key store provider for type {}", store_type))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct JwksOnly;

    impl KeyStoreProvider for JwksOnly {
        fn name(&self) -> &str {
            "jwks-only"
        }

        fn supports(&self, store_type: KeyStoreType) -> bool {
            store_type == KeyStoreType::Jwks
        }

        fn load(&self, _: KeyStoreType, _: &[u8], _: &str) -> Result<KeySet, DomainError> {
            Ok(KeySet::default())
        }
    }

    #[test]
    fn test_store_type_parsing() {
        assert_eq!("PKCS8".parse::<KeyStoreType>().unwrap(), KeyStoreType::Pkcs8);
        assert_eq!("jwks".parse::<KeyStoreType>().unwrap(), KeyStoreType::Jwks);
        assert!("jks".parse::<KeyStoreType>().is_err());
        assert_eq!(KeyStoreType::default(), KeyStoreType::Pkcs8);
    }

    #[test]
    fn test_default_provider() {
        let registry = ProviderRegistry::new();
        let provider = registry.resolve(KeyStoreType::Pkcs8, None).unwrap();
        assert_eq!(provider.name(), DEFAULT_PROVIDER);
    }

    #[test]
    fn test_named_provider() {
        let registry = ProviderRegistry::new().with_provider(Arc::new(JwksOnly));
        let provider = registry.resolve(KeyStoreType::Jwks, Some("JWKS-ONLY")).unwrap();
        assert_eq!(provider.name(), "jwks-only");
    }

    #[test]
    fn test_unknown_provider_falls_back() {
        let registry = ProviderRegistry::new();
        let provider = registry.resolve(KeyStoreType::Jwks, Some("bouncycastle")).unwrap();
        assert_eq!(provider.name(), DEFAULT_PROVIDER);
    }

    #[test]
    fn test_provider_without_type_support_falls_back() {
        let registry = ProviderRegistry::new().with_provider(Arc::new(JwksOnly));
        let provider = registry.resolve(KeyStoreType::Pkcs8, Some("jwks-only")).unwrap();
        assert_eq!(provider.name(), DEFAULT_PROVIDER);
    }
}
