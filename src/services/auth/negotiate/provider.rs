use async_trait::async_trait;
use axum::http::request::Parts;
use axum::response::Response;
use thiserror::Error;

use super::header::HeaderError;
use crate::services::auth::principal::NegotiatedIdentity;

#[derive(Debug, Error)]
pub enum NegotiationError {
    #[error(transparent)]
    Header(#[from] HeaderError),
    #[error("unsupported security package: {0}")]
    UnsupportedPackage(String),
    #[error("handshake could not be completed: {0}")]
    Handshake(String),
}

/// Outcome of one negotiation leg.
#[derive(Debug)]
pub enum Negotiation {
    /// Handshake finished; the identity is validated.
    Complete(NegotiatedIdentity),
    /// More legs are needed; send this challenge (usually 401 + continuation token).
    Continue(Response),
}

/// Upstream component that performs (or trusts) the network identity handshake.
#[async_trait]
pub trait NegotiationProvider: Send + Sync {
    /// Security packages advertised in `WWW-Authenticate`, in preference order.
    fn protocols(&self) -> &[String];

    /// Whether this request carries credentials the provider handles.
    fn accepts(&self, request: &Parts) -> bool;

    async fn negotiate(&self, request: &Parts) -> Result<Negotiation, NegotiationError>;
}
