//! Claims to account mapping for the demo application

use async_trait::async_trait;

use crate::domain::{Account, Authenticator, Authorizer, ClaimsSet, DomainError};

/// Rebuilds the [`Account`] carried in the token claims
#[derive(Debug, Clone, Copy, Default)]
pub struct AccountClaimsAuthenticator;

#[async_trait]
impl Authenticator<Account> for AccountClaimsAuthenticator {
    async fn authenticate(&self, claims: &ClaimsSet) -> Result<Option<Account>, DomainError> {
        Ok(Account::from_claims(claims))
    }
}

/// Grants a role when the account lists it
#[derive(Debug, Clone, Copy, Default)]
pub struct AccountRoleAuthorizer;

impl Authorizer<Account> for AccountRoleAuthorizer {
    fn authorize(&self, principal: &Account, role: &str) -> bool {
        principal.has_role(role)
    }
}
