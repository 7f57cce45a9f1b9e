//! Authorization authority: optional collaborator that re-validates a negotiated
//! principal and may replace it with an enriched one.

use std::collections::HashSet;

use async_trait::async_trait;
use thiserror::Error;

use super::principal::Principal;

/// The authority does not accept the identity at all.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct AuthenticationError {
    message: String,
}

impl AuthenticationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// The identity is accepted but not allowed to proceed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct AccessDeniedError {
    message: String,
}

impl AccessDeniedError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthorityError {
    #[error("authentication rejected: {0}")]
    Authentication(#[from] AuthenticationError),
    #[error("access denied: {0}")]
    AccessDenied(#[from] AccessDeniedError),
}

/// Result of the authorization step; exactly one variant per request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthorizationOutcome {
    Accepted(Principal),
    AuthenticationRejected(AuthenticationError),
    AccessDenied(AccessDeniedError),
}

impl From<Result<Principal, AuthorityError>> for AuthorizationOutcome {
    fn from(result: Result<Principal, AuthorityError>) -> Self {
        match result {
            Ok(principal) => Self::Accepted(principal),
            Err(AuthorityError::Authentication(e)) => Self::AuthenticationRejected(e),
            Err(AuthorityError::AccessDenied(e)) => Self::AccessDenied(e),
        }
    }
}

/// External authority consulted after negotiation.
///
/// Implementations must be safe to share across concurrent requests; the
/// delegator never locks around them.
#[async_trait]
pub trait Authority: Send + Sync {
    /// Returns the principal to publish, which may differ from the input.
    async fn authenticate(&self, principal: Principal) -> Result<Principal, AuthorityError>;
}

/// Simple role gate:
/// - users on the deny list are rejected as authentication failures
/// - principals without `required_role` are denied access
/// - everybody else passes, with `required_role` granted explicitly
#[derive(Debug, Clone)]
pub struct RoleGateAuthority {
    required_role: String,
    denied_users: HashSet<String>,
}

impl RoleGateAuthority {
    pub fn new(required_role: impl Into<String>) -> Self {
        Self {
            required_role: required_role.into(),
            denied_users: HashSet::new(),
        }
    }

    pub fn with_denied_users<I, S>(mut self, users: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.denied_users
            .extend(users.into_iter().map(|u| u.as_ref().to_ascii_lowercase()));
        self
    }

    pub fn required_role(&self) -> &str {
        &self.required_role
    }
}

#[async_trait]
impl Authority for RoleGateAuthority {
    async fn authenticate(&self, principal: Principal) -> Result<Principal, AuthorityError> {
        if self
            .denied_users
            .contains(&principal.name().to_ascii_lowercase())
        {
            return Err(AuthenticationError::new(format!(
                "user {} is not accepted",
                principal.name()
            ))
            .into());
        }

        let allowed = principal.has_authority(&self.required_role)
            || principal
                .roles()
                .iter()
                .any(|role| role.eq_ignore_ascii_case(&self.required_role));
        if !allowed {
            return Err(AccessDeniedError::new(format!(
                "user {} lacks {}",
                principal.name(),
                self.required_role
            ))
            .into());
        }

        Ok(principal.with_authority(self.required_role.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn denied_user_is_authentication_error() {
        let authority = RoleGateAuthority::new("ROLE_ADMIN").with_denied_users(["CORP\\Mallory"]);
        let principal = Principal::new("corp\\mallory").with_authority("ROLE_ADMIN");

        let err = authority.authenticate(principal).await.unwrap_err();
        assert!(matches!(err, AuthorityError::Authentication(_)));
    }

    #[tokio::test]
    async fn missing_role_is_access_denied() {
        let authority = RoleGateAuthority::new("ROLE_ADMIN");

        let err = authority
            .authenticate(Principal::new("alice").with_authority("ROLE_USER"))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            AuthorityError::AccessDenied(AccessDeniedError::new("user alice lacks ROLE_ADMIN"))
        );
    }

    #[tokio::test]
    async fn matching_raw_role_grants_required_authority() {
        let authority = RoleGateAuthority::new("CORP\\Admins");

        let principal = authority
            .authenticate(Principal::new("alice").with_role("corp\\admins"))
            .await
            .unwrap();
        assert!(principal.has_authority("CORP\\Admins"));
    }

    #[test]
    fn outcome_from_result_keeps_error_class() {
        let denied: AuthorizationOutcome =
            Err(AuthorityError::from(AccessDeniedError::new("no"))).into();
        assert_eq!(
            denied,
            AuthorizationOutcome::AccessDenied(AccessDeniedError::new("no"))
        );

        let rejected: AuthorizationOutcome =
            Err(AuthorityError::from(AuthenticationError::new("bad token"))).into();
        assert!(matches!(
            rejected,
            AuthorizationOutcome::AuthenticationRejected(e) if e.message() == "bad token"
        ));

        let accepted: AuthorizationOutcome = Ok(Principal::new("alice")).into();
        assert_eq!(
            accepted,
            AuthorizationOutcome::Accepted(Principal::new("alice"))
        );
    }
}
