use std::path::PathBuf;
use std::str::FromStr;

use jsonwebtoken::Algorithm;
use serde::Deserialize;
use validator::{Validate, ValidationError};

use crate::domain::jwk::is_rsa_algorithm;
use crate::domain::DomainError;
use crate::infrastructure::keystore::KeyStoreType;

/// Application configuration
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[validate(nested)]
    pub jwt: JwtSettings,
    #[serde(default)]
    pub accounts: Vec<AccountConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Key material, issuer and credential lookup settings
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct JwtSettings {
    /// File path, URL, resource name or inline base64 key store
    #[validate(length(min = 1, message = "key store locator is required"))]
    pub key_store_path: String,
    #[validate(length(min = 1, message = "key store password is required"))]
    pub key_store_password: String,
    #[serde(default)]
    pub key_store_type: KeyStoreType,
    #[serde(default)]
    pub key_store_provider: Option<String>,
    #[serde(default = "default_resource_dirs")]
    pub resource_dirs: Vec<PathBuf>,
    #[serde(default = "default_signing_algorithm")]
    #[validate(custom(function = "validate_signing_algorithm"))]
    pub signing_algorithm: String,
    #[serde(default = "default_token_lifetime_secs")]
    #[validate(range(min = 1, message = "token lifetime must be positive"))]
    pub token_lifetime_secs: u64,
    #[validate(length(min = 1, message = "issuer is required"))]
    pub issuer: String,
    #[serde(default = "default_token_name")]
    #[validate(length(min = 1))]
    pub query_parameter_name: String,
    /// Empty disables cookie lookup
    #[serde(default = "default_token_name")]
    pub cookie_name: String,
    #[serde(default = "default_header_prefix")]
    #[validate(length(min = 1))]
    pub header_prefix: String,
    #[serde(default = "default_true")]
    pub enforce_expiry: bool,
    #[serde(default)]
    pub expiry_leeway_secs: u64,
}

/// A demo login account; the password is hashed at startup
#[derive(Debug, Clone, Deserialize)]
pub struct AccountConfig {
    pub id: String,
    pub username: String,
    pub name: String,
    pub password: String,
    #[serde(default)]
    pub roles: Vec<String>,
}

fn default_resource_dirs() -> Vec<PathBuf> {
    vec![PathBuf::from("resources")]
}

fn default_signing_algorithm() -> String {
    "RS256".to_string()
}

fn default_token_lifetime_secs() -> u64 {
    3600
}

fn default_token_name() -> String {
    "token".to_string()
}

fn default_header_prefix() -> String {
    "Bearer".to_string()
}

fn default_true() -> bool {
    true
}

fn validate_signing_algorithm(value: &str) -> Result<(), ValidationError> {
    match Algorithm::from_str(value) {
        Ok(alg) if is_rsa_algorithm(alg) => Ok(()),
        _ => Err(ValidationError::new("unsupported_signing_algorithm")),
    }
}

impl JwtSettings {
    /// Settings with defaults for everything but the key store and issuer
    pub fn new(
        key_store_path: impl Into<String>,
        key_store_password: impl Into<String>,
        issuer: impl Into<String>,
    ) -> Self {
        Self {
            key_store_path: key_store_path.into(),
            key_store_password: key_store_password.into(),
            key_store_type: KeyStoreType::default(),
            key_store_provider: None,
            resource_dirs: default_resource_dirs(),
            signing_algorithm: default_signing_algorithm(),
            token_lifetime_secs: default_token_lifetime_secs(),
            issuer: issuer.into(),
            query_parameter_name: default_token_name(),
            cookie_name: default_token_name(),
            header_prefix: default_header_prefix(),
            enforce_expiry: true,
            expiry_leeway_secs: 0,
        }
    }

    /// Validate every field, reporting the failures as one configuration error
    pub fn check(&self) -> Result<(), DomainError> {
        self.validate()
            .map_err(|e| DomainError::configuration(format!("Invalid JWT settings: {}", e)))
    }

    pub fn algorithm(&self) -> Result<Algorithm, DomainError> {
        validate_signing_algorithm(&self.signing_algorithm).map_err(|_| {
            DomainError::configuration(format!(
                "Unsupported signing algorithm '{}'",
                self.signing_algorithm
            ))
        })?;

        Algorithm::from_str(&self.signing_algorithm)
            .map_err(|e| DomainError::configuration(format!("Invalid signing algorithm: {}", e)))
    }

    /// Cookie lookup name, `None` when disabled
    pub fn cookie(&self) -> Option<&str> {
        Some(self.cookie_name.trim()).filter(|name| !name.is_empty())
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(
                config::Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}
