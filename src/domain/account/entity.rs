//! Account entity and its claim mapping

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::token::ClaimsSet;

pub const ACCOUNT_ID_CLAIM: &str = "accountId";
pub const ACCOUNT_USERNAME_CLAIM: &str = "accountUsername";
pub const ACCOUNT_NAME_CLAIM: &str = "accountName";
pub const ACCOUNT_ROLES_CLAIM: &str = "roles";

/// An authenticated account. Everything needed to rebuild it travels in the token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: String,
    pub username: String,
    pub name: String,
    #[serde(default)]
    pub roles: Vec<String>,
}

impl Account {
    pub fn new(id: impl Into<String>, username: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            username: username.into(),
            name: name.into(),
            roles: Vec::new(),
        }
    }

    pub fn with_roles<I, S>(mut self, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.roles = roles.into_iter().map(Into::into).collect();
        self
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }

    /// Application claims describing this account
    pub fn to_claims(&self) -> ClaimsSet {
        ClaimsSet::new()
            .with_claim(ACCOUNT_ID_CLAIM, self.id.clone())
            .with_claim(ACCOUNT_USERNAME_CLAIM, self.username.clone())
            .with_claim(ACCOUNT_NAME_CLAIM, self.name.clone())
            .with_claim(
                ACCOUNT_ROLES_CLAIM,
                Value::from(self.roles.iter().map(|r| Value::from(r.as_str())).collect::<Vec<_>>()),
            )
    }

    /// Rebuild an account from claims, `None` if a required claim is missing
    pub fn from_claims(claims: &ClaimsSet) -> Option<Self> {
        let roles = match claims.get(ACCOUNT_ROLES_CLAIM) {
            Some(Value::Array(values)) => values
                .iter()
                .map(|v| v.as_str().map(str::to_string))
                .collect::<Option<Vec<_>>>()?,
            Some(_) => return None,
            None => Vec::new(),
        };

        Some(Self {
            id: claims.get_str(ACCOUNT_ID_CLAIM)?.to_string(),
            username: claims.get_str(ACCOUNT_USERNAME_CLAIM)?.to_string(),
            name: claims.get_str(ACCOUNT_NAME_CLAIM)?.to_string(),
            roles,
        })
    }
}
