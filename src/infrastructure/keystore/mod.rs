//! Key store loading: locator resolution, formats and providers

pub mod jwks_store;
mod locator;
pub mod pkcs8_store;
mod provider;

pub use jwks_store::{PrivateJwk, PrivateJwkSet};
pub use locator::{KeySource, KeyStoreLoader};
pub use provider::{
    KeyStoreProvider, KeyStoreType, ProviderRegistry, RustCryptoProvider, DEFAULT_PROVIDER,
};
