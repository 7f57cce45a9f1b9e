//! Delegating negotiate filter.
//!
//! Runs after the negotiation provider produced a principal and decides what
//! happens next:
//! 1. optionally re-authorize through the configured `Authority`
//! 2. publish the (possibly replaced) principal into the request `SecurityContext`
//! 3. optionally notify the success hook
//! 4. on authority failure, translate the error into exactly one response
//!    (failure / access-denied hook, or the generic unauthorized challenge)
//!
//! Nothing in here escapes as an error: every path ends in a `Delegation`.

use std::sync::Arc;

use axum::http::{HeaderMap, request::Parts};
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::{debug, trace, warn};

use super::authority::{
    AccessDeniedError, AuthenticationError, Authority, AuthorizationOutcome,
};
use super::challenge;
use super::context::SecurityContext;
use super::hooks::{AccessDeniedHook, FailureHook, HookSet, SuccessHook};
use super::negotiate::NegotiationProvider;
use super::principal::{Principal, PrincipalPolicy};
use crate::error::AppError;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    #[error("missing negotiation provider")]
    MissingProvider,
}

/// Result of `delegate`.
#[derive(Debug)]
pub enum Delegation {
    /// Continue the request. `headers` were staged by the success hook.
    Accepted { headers: HeaderMap },
    /// Stop processing; the response is final.
    Rejected(Response),
}

impl Delegation {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted { .. })
    }

    pub fn into_rejection(self) -> Option<Response> {
        match self {
            Self::Accepted { .. } => None,
            Self::Rejected(response) => Some(response),
        }
    }
}

/// Configured once at startup and shared read-only across requests.
#[derive(Clone)]
pub struct DelegatingNegotiateFilter {
    provider: Option<Arc<dyn NegotiationProvider>>,
    authority: Option<Arc<dyn Authority>>,
    hooks: HookSet,
    allow_guest_login: bool,
    principal_policy: PrincipalPolicy,
}

impl std::fmt::Debug for DelegatingNegotiateFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DelegatingNegotiateFilter")
            .field("provider", &self.provider.as_ref().map(|p| p.protocols()))
            .field("authority", &self.authority.is_some())
            .field("hooks", &self.hooks)
            .field("allow_guest_login", &self.allow_guest_login)
            .field("principal_policy", &self.principal_policy)
            .finish()
    }
}

impl Default for DelegatingNegotiateFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl DelegatingNegotiateFilter {
    pub fn new() -> Self {
        debug!("delegating negotiate filter loaded");
        Self {
            provider: None,
            authority: None,
            hooks: HookSet::default(),
            allow_guest_login: true,
            principal_policy: PrincipalPolicy::default(),
        }
    }

    pub fn with_provider(mut self, provider: Arc<dyn NegotiationProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn with_authority(mut self, authority: Arc<dyn Authority>) -> Self {
        self.authority = Some(authority);
        self
    }

    pub fn with_success_hook(mut self, hook: Arc<dyn SuccessHook>) -> Self {
        self.hooks = self.hooks.with_success(hook);
        self
    }

    pub fn with_failure_hook(mut self, hook: Arc<dyn FailureHook>) -> Self {
        self.hooks = self.hooks.with_failure(hook);
        self
    }

    pub fn with_access_denied_hook(mut self, hook: Arc<dyn AccessDeniedHook>) -> Self {
        self.hooks = self.hooks.with_access_denied(hook);
        self
    }

    pub fn with_allow_guest_login(mut self, allow: bool) -> Self {
        self.allow_guest_login = allow;
        self
    }

    pub fn with_principal_policy(mut self, policy: PrincipalPolicy) -> Self {
        self.principal_policy = policy;
        self
    }

    pub fn provider(&self) -> Option<&Arc<dyn NegotiationProvider>> {
        self.provider.as_ref()
    }

    pub fn authority(&self) -> Option<&Arc<dyn Authority>> {
        self.authority.as_ref()
    }

    pub fn hooks(&self) -> &HookSet {
        &self.hooks
    }

    pub fn allow_guest_login(&self) -> bool {
        self.allow_guest_login
    }

    pub fn principal_policy(&self) -> &PrincipalPolicy {
        &self.principal_policy
    }

    /// Startup check. Only the provider is mandatory.
    pub fn validate_configuration(&self) -> Result<(), ConfigurationError> {
        if self.provider.is_none() {
            return Err(ConfigurationError::MissingProvider);
        }
        Ok(())
    }

    pub async fn delegate(
        &self,
        request: &Parts,
        context: &mut SecurityContext,
        principal: Principal,
    ) -> Delegation {
        let outcome = match &self.authority {
            Some(authority) => {
                debug!(principal = %principal, "delegating to authority");
                AuthorizationOutcome::from(authority.authenticate(principal).await)
            }
            None => AuthorizationOutcome::Accepted(principal),
        };

        match outcome {
            AuthorizationOutcome::Accepted(principal) => {
                let published = context.publish(principal);
                let mut headers = HeaderMap::new();

                if let Some(hook) = self.hooks.success() {
                    let notified = hook
                        .on_authentication_success(request, &mut headers, published)
                        .await;
                    if let Err(err) = notified {
                        warn!(error = %err, "error calling success hook");
                        trace!(error = ?err, "success hook failure");
                        return Delegation::Rejected(success_hook_failed(headers));
                    }
                }

                Delegation::Accepted { headers }
            }
            AuthorizationOutcome::AuthenticationRejected(err) => {
                warn!(error = %err, "error authenticating user in authority");
                Delegation::Rejected(self.send_authentication_failed(request, &err).await)
            }
            AuthorizationOutcome::AccessDenied(err) => {
                warn!(error = %err, "error authorizing user in authority");
                Delegation::Rejected(self.send_access_denied(request, &err).await)
            }
        }
    }

    /// Generic challenge advertising the provider's protocols.
    pub fn send_unauthorized(&self, close: bool) -> Response {
        let protocols = self.provider.as_ref().map(|p| p.protocols()).unwrap_or(&[]);
        challenge::unauthorized(protocols, close)
    }

    async fn send_authentication_failed(
        &self,
        request: &Parts,
        error: &AuthenticationError,
    ) -> Response {
        if let Some(hook) = self.hooks.failure() {
            match hook.on_authentication_failure(request, error).await {
                Ok(response) => return response,
                Err(err) => {
                    warn!(kind = err.kind(), error = %err, "error invoking failure hook");
                    trace!(error = ?err, "failure hook failure");
                }
            }
        }
        self.send_unauthorized(true)
    }

    async fn send_access_denied(&self, request: &Parts, error: &AccessDeniedError) -> Response {
        if let Some(hook) = self.hooks.access_denied() {
            match hook.handle(request, error).await {
                Ok(response) => return response,
                Err(err) => {
                    warn!(kind = err.kind(), error = %err, "error invoking access denied hook");
                    trace!(error = ?err, "access denied hook failure");
                }
            }
        }
        // fallback
        self.send_unauthorized(true)
    }
}

// Status and body come from the filter (500, `AppError::Internal`); the hook only
// contributes its staged headers. No challenge is added.
fn success_hook_failed(headers: HeaderMap) -> Response {
    let mut response = AppError::Internal.into_response();
    response.headers_mut().extend(headers);
    response
}
