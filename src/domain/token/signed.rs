use std::fmt;

use jsonwebtoken::Header;

use super::ClaimsSet;

/// A minted, immutable JWS in compact serialization together with the
/// header and claims it was built from
#[derive(Debug, Clone)]
pub struct SignedToken {
    compact: String,
    header: Header,
    claims: ClaimsSet,
}

impl SignedToken {
    pub(crate) fn new(compact: String, header: Header, claims: ClaimsSet) -> Self {
        Self {
            compact,
            header,
            claims,
        }
    }

    /// Compact `header.payload.signature` form
    pub fn serialize(&self) -> &str {
        &self.compact
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn claims(&self) -> &ClaimsSet {
        &self.claims
    }

    pub fn kid(&self) -> Option<&str> {
        self.header.kid.as_deref()
    }

    pub fn into_string(self) -> String {
        self.compact
    }
}

impl fmt::Display for SignedToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.compact)
    }
}

impl AsRef<str> for SignedToken {
    fn as_ref(&self) -> &str {
        &self.compact
    }
}
