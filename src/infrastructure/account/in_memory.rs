//! Account store backed by a fixed list of configured accounts

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use super::password::{Argon2Hasher, PasswordHasher};
use crate::config::AccountConfig;
use crate::domain::{Account, AccountStore, DomainError};

#[derive(Debug, Clone)]
struct StoredAccount {
    account: Account,
    password_hash: String,
}

/// Accounts keyed by username with Argon2 password hashes
#[derive(Debug)]
pub struct InMemoryAccountStore {
    accounts: HashMap<String, StoredAccount>,
    hasher: Arc<dyn PasswordHasher>,
}

impl Default for InMemoryAccountStore {
    fn default() -> Self {
        Self::new(Arc::new(Argon2Hasher::new()))
    }
}

impl InMemoryAccountStore {
    pub fn new(hasher: Arc<dyn PasswordHasher>) -> Self {
        Self {
            accounts: HashMap::new(),
            hasher,
        }
    }

    /// Hash `password` and store the account. Usernames must be unique.
    pub fn insert(&mut self, account: Account, password: &str) -> Result<(), DomainError> {
        if self.accounts.contains_key(&account.username) {
            return Err(DomainError::validation(format!(
                "Duplicate account username '{}'",
                account.username
            )));
        }

        let password_hash = self.hasher.hash(password)?;
        self.accounts.insert(
            account.username.clone(),
            StoredAccount {
                account,
                password_hash,
            },
        );
        Ok(())
    }

    pub fn from_config(accounts: &[AccountConfig]) -> Result<Self, DomainError> {
        let mut store = Self::default();

        for config in accounts {
            let account = Account::new(&config.id, &config.username, &config.name)
                .with_roles(config.roles.iter().cloned());
            store.insert(account, &config.password)?;
        }

        Ok(store)
    }
}

#[async_trait]
impl AccountStore for InMemoryAccountStore {
    async fn authenticate(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Option<Account>, DomainError> {
        let Some(stored) = self.accounts.get(username) else {
            debug!(username, "Unknown account");
            return Ok(None);
        };

        if self.hasher.verify(password, &stored.password_hash) {
            Ok(Some(stored.account.clone()))
        } else {
            debug!(username, "Password mismatch");
            Ok(None)
        }
    }

    async fn count(&self) -> Result<usize, DomainError> {
        Ok(self.accounts.len())
    }
}
