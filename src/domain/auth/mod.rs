//! Application seams of the request authentication pipeline
//!
//! The pipeline verifies tokens itself; turning verified claims into an
//! application principal and deciding role membership is delegated here.

use async_trait::async_trait;

#[cfg(test)]
use mockall::automock;

use crate::domain::token::ClaimsSet;
use crate::domain::DomainError;

/// Maps a verified claims set to an application principal.
///
/// `Ok(None)` means the claims are not acceptable and the request is
/// rejected like any other unauthenticated request. `Err` means the decision
/// could not be made (e.g. an identity backend is down) and is surfaced as a
/// server error instead.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait Authenticator<P: Send + Sync + 'static>: Send + Sync {
    async fn authenticate(&self, claims: &ClaimsSet) -> Result<Option<P>, DomainError>;
}

/// Decides whether a principal holds a role
pub trait Authorizer<P>: Send + Sync {
    fn authorize(&self, principal: &P, role: &str) -> bool;
}

impl<P, F> Authorizer<P> for F
where
    F: Fn(&P, &str) -> bool + Send + Sync,
{
    fn authorize(&self, principal: &P, role: &str) -> bool {
        self(principal, role)
    }
}

/// Authorizer granting every role
#[derive(Debug, Clone, Copy, Default)]
pub struct PermitAll;

impl<P> Authorizer<P> for PermitAll {
    fn authorize(&self, _principal: &P, _role: &str) -> bool {
        true
    }
}
