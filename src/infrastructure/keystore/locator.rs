//! Key store locator resolution and loading

use std::path::{Path, PathBuf};

use base64::engine::general_purpose::{STANDARD, STANDARD_NO_PAD, URL_SAFE, URL_SAFE_NO_PAD};
use base64::Engine;
use reqwest::Url;
use tracing::{debug, info};

use super::provider::{KeyStoreType, ProviderRegistry};
use crate::domain::{DomainError, KeySet};

const RESOURCE_PREFIX: &str = "classpath:";

/// Where a locator string points to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeySource {
    Url(Url),
    File(PathBuf),
    Resource(PathBuf),
    Inline(Vec<u8>),
}

impl KeySource {
    fn describe(&self) -> String {
        match self {
            Self::Url(url) => format!("url {}", url),
            Self::File(path) => format!("file {}", path.display()),
            Self::Resource(path) => format!("resource {}", path.display()),
            Self::Inline(bytes) => format!("inline data ({} bytes)", bytes.len()),
        }
    }
}

/// Loads key sets from a URL, a file, a resource directory or inline base64
#[derive(Debug, Clone)]
pub struct KeyStoreLoader {
    registry: ProviderRegistry,
    resource_dirs: Vec<PathBuf>,
    http: reqwest::Client,
}

impl Default for KeyStoreLoader {
    fn default() -> Self {
        Self::new(ProviderRegistry::new(), Vec::new())
    }
}

impl KeyStoreLoader {
    pub fn new(registry: ProviderRegistry, resource_dirs: Vec<PathBuf>) -> Self {
        Self {
            registry,
            resource_dirs,
            http: reqwest::Client::new(),
        }
    }

    pub fn with_http_client(mut self, http: reqwest::Client) -> Self {
        self.http = http;
        self
    }

    /// Resolve the locator, read its bytes and decode them with the chosen provider
    pub async fn load(
        &self,
        locator: &str,
        password: &str,
        store_type: KeyStoreType,
        provider: Option<&str>,
    ) -> Result<KeySet, DomainError> {
        let source = self.resolve(locator)?;
        debug!(source = %source.describe(), store_type = %store_type, "Loading key store");

        let bytes = self.read(source.clone()).await?;
        let provider = self.registry.resolve(store_type, provider)?;
        let keys = provider.load(store_type, &bytes, password)?;

        info!(
            source = %source.describe(),
            provider = provider.name(),
            keys = keys.len(),
            "Key store loaded"
        );

        Ok(keys)
    }

    /// Work out what a locator refers to: URL, then file, then resource, then inline base64
    pub fn resolve(&self, locator: &str) -> Result<KeySource, DomainError> {
        let locator = locator.trim();
        if locator.is_empty() {
            return Err(DomainError::configuration("Key store locator is empty"));
        }

        if locator.contains("://") {
            let url = Url::parse(locator).map_err(|e| {
                DomainError::configuration(format!("Invalid key store URL '{}': {}", locator, e))
            })?;
            return Ok(KeySource::Url(url));
        }

        let path = Path::new(locator);
        if path.is_file() {
            return Ok(KeySource::File(path.to_path_buf()));
        }

        let resource = locator.strip_prefix(RESOURCE_PREFIX).unwrap_or(locator);
        let resource = resource.trim_start_matches('/');
        if let Some(found) = self
            .resource_dirs
            .iter()
            .map(|dir| dir.join(resource))
            .find(|candidate| candidate.is_file())
        {
            return Ok(KeySource::Resource(found));
        }

        if let Some(bytes) = decode_base64(locator) {
            return Ok(KeySource::Inline(bytes));
        }

        Err(DomainError::key_store(format!(
            "Key store '{}' is not a URL, file, resource or base64 data",
            locator
        )))
    }

    async fn read(&self, source: KeySource) -> Result<Vec<u8>, DomainError> {
        match source {
            KeySource::Url(url) if url.scheme() == "file" => {
                let path = url.to_file_path().map_err(|_| {
                    DomainError::configuration(format!("Invalid file URL: {}", url))
                })?;
                read_file(&path).await
            }
            KeySource::Url(url) => self.fetch(url).await,
            KeySource::File(path) | KeySource::Resource(path) => read_file(&path).await,
            KeySource::Inline(bytes) => Ok(bytes),
        }
    }

    async fn fetch(&self, url: Url) -> Result<Vec<u8>, DomainError> {
        let response = self
            .http
            .get(url.clone())
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| DomainError::key_store(format!("Failed to fetch key store {}: {}", url, e)))?;

        let bytes = response
            .bytes()
            .await
            .map_err(|e| DomainError::key_store(format!("Failed to read key store {}: {}", url, e)))?;

        Ok(bytes.to_vec())
    }
}

async fn read_file(path: &Path) -> Result<Vec<u8>, DomainError> {
    tokio::fs::read(path).await.map_err(|e| {
        DomainError::key_store(format!("Failed to read key store {}: {}", path.display(), e))
    })
}

fn decode_base64(value: &str) -> Option<Vec<u8>> {
    let compact: String = value.chars().filter(|c| !c.is_ascii_whitespace()).collect();

    [&STANDARD, &URL_SAFE, &STANDARD_NO_PAD, &URL_SAFE_NO_PAD]
        .into_iter()
        .find_map(|engine| engine.decode(&compact).ok())
        .filter(|bytes| !bytes.is_empty())
}
