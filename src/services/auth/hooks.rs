//! Pluggable hooks supplied by the embedding application.
//!
//! Every hook is optional. A missing hook means "use the default behavior":
//! nothing extra on success, the generic unauthorized challenge on failure.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use axum::http::{HeaderMap, request::Parts};
use axum::response::Response;
use thiserror::Error;

use super::authority::{AccessDeniedError, AuthenticationError};
use super::principal::Principal;

/// Failure raised by a hook while producing its part of the response.
#[derive(Debug, Error)]
pub enum HookError {
    #[error("i/o failure: {0}")]
    Io(#[from] std::io::Error),
    #[error("protocol failure: {0}")]
    Protocol(String),
}

impl HookError {
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol(message.into())
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Io(_) => "i/o",
            Self::Protocol(_) => "protocol",
        }
    }
}

/// Called once the principal has been published.
///
/// `response_headers` are merged into the downstream response when the request
/// continues.
///
/// The hook only stages headers; it never chooses the status. If it fails, the
/// filter rejects the request with `500 Internal Server Error` and the
/// `AppError::Internal` JSON body, keeps every header the hook staged and adds
/// no `WWW-Authenticate` challenge. The published principal stays in the
/// security context.
#[async_trait]
pub trait SuccessHook: Send + Sync {
    async fn on_authentication_success(
        &self,
        request: &Parts,
        response_headers: &mut HeaderMap,
        principal: &Principal,
    ) -> Result<(), HookError>;
}

/// Produces the response for an authority authentication failure.
#[async_trait]
pub trait FailureHook: Send + Sync {
    async fn on_authentication_failure(
        &self,
        request: &Parts,
        error: &AuthenticationError,
    ) -> Result<Response, HookError>;
}

/// Produces the response for an authority access denial.
#[async_trait]
pub trait AccessDeniedHook: Send + Sync {
    async fn handle(&self, request: &Parts, error: &AccessDeniedError)
    -> Result<Response, HookError>;
}

/// The three hook capabilities, configured once and then read-only.
#[derive(Clone, Default)]
pub struct HookSet {
    success: Option<Arc<dyn SuccessHook>>,
    failure: Option<Arc<dyn FailureHook>>,
    access_denied: Option<Arc<dyn AccessDeniedHook>>,
}

impl HookSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_success(mut self, hook: Arc<dyn SuccessHook>) -> Self {
        self.success = Some(hook);
        self
    }

    pub fn with_failure(mut self, hook: Arc<dyn FailureHook>) -> Self {
        self.failure = Some(hook);
        self
    }

    pub fn with_access_denied(mut self, hook: Arc<dyn AccessDeniedHook>) -> Self {
        self.access_denied = Some(hook);
        self
    }

    pub fn success(&self) -> Option<&Arc<dyn SuccessHook>> {
        self.success.as_ref()
    }

    pub fn failure(&self) -> Option<&Arc<dyn FailureHook>> {
        self.failure.as_ref()
    }

    pub fn access_denied(&self) -> Option<&Arc<dyn AccessDeniedHook>> {
        self.access_denied.as_ref()
    }
}

impl fmt::Debug for HookSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookSet")
            .field("success", &self.success.is_some())
            .field("failure", &self.failure.is_some())
            .field("access_denied", &self.access_denied.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Noop;

    #[async_trait]
    impl SuccessHook for Noop {
        async fn on_authentication_success(
            &self,
            _request: &Parts,
            _response_headers: &mut HeaderMap,
            _principal: &Principal,
        ) -> Result<(), HookError> {
            Ok(())
        }
    }

    #[test]
    fn empty_set_has_no_capabilities() {
        let hooks = HookSet::new();
        assert!(hooks.success().is_none());
        assert!(hooks.failure().is_none());
        assert!(hooks.access_denied().is_none());
    }

    #[test]
    fn hooks_are_independent() {
        let hooks = HookSet::new().with_success(Arc::new(Noop));
        assert!(hooks.success().is_some());
        assert!(hooks.failure().is_none());
        assert_eq!(
            format!("{hooks:?}"),
            "HookSet { success: true, failure: false, access_denied: false }"
        );
    }

    #[test]
    fn error_kinds() {
        let io = HookError::from(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "gone"));
        assert_eq!(io.kind(), "i/o");
        assert_eq!(HookError::protocol("bad state").kind(), "protocol");
        assert_eq!(
            HookError::protocol("bad state").to_string(),
            "protocol failure: bad state"
        );
    }
}
