use thiserror::Error;

/// Core domain errors
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Key store error: {message}")]
    KeyStore { message: String },

    #[error("Minting error: {message}")]
    Minting { message: String },

    #[error("Authentication backend error: {message}")]
    Authentication { message: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl DomainError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn key_store(message: impl Into<String>) -> Self {
        Self::KeyStore {
            message: message.into(),
        }
    }

    pub fn minting(message: impl Into<String>) -> Self {
        Self::Minting {
            message: message.into(),
        }
    }

    pub fn authentication(message: impl Into<String>) -> Self {
        Self::Authentication {
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// True for errors raised while reading or decoding key material
    pub fn is_key_store(&self) -> bool {
        matches!(self, Self::KeyStore { .. })
    }
}
