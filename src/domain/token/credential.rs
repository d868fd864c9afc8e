//! Where a candidate token was found in a request

use std::fmt;

/// Request location of a credential, with the parameter name it was read from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialLocation {
    QueryParameter(String),
    Cookie(String),
    /// `Authorization` header with the given scheme
    AuthorizationHeader(String),
}

impl fmt::Display for CredentialLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::QueryParameter(name) => write!(f, "query parameter '{}'", name),
            Self::Cookie(name) => write!(f, "cookie '{}'", name),
            Self::AuthorizationHeader(scheme) => write!(f, "Authorization header ({})", scheme),
        }
    }
}

/// A candidate token string and its location. Lives for one authentication attempt.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    pub location: CredentialLocation,
    pub token: String,
}

impl Credential {
    pub fn new(location: CredentialLocation, token: impl Into<String>) -> Self {
        Self {
            location,
            token: token.into(),
        }
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("location", &self.location)
            .field("token", &"[hidden]")
            .finish()
    }
}
