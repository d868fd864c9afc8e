use async_trait::async_trait;

use super::Account;
use crate::domain::DomainError;

/// Username/password check backing the login endpoint
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Returns the account when the credentials match, `None` otherwise
    async fn authenticate(&self, username: &str, password: &str)
        -> Result<Option<Account>, DomainError>;

    /// Number of accounts, used by health checks
    async fn count(&self) -> Result<usize, DomainError>;
}
