//! Provider for deployments where a fronting proxy terminates Kerberos/SPNEGO.
//!
//! The proxy completes the handshake and forwards the validated user in a
//! trusted header. This service must only be reachable through that proxy.
//!
//! Headers (names configurable):
//! - `x-remote-user`: `DOMAIN\user`
//! - `x-remote-sid`: user SID (optional)
//! - `x-remote-groups`: `DOMAIN\Group|S-1-5-...,Everyone` (sid part optional)

use async_trait::async_trait;
use axum::http::{HeaderMap, HeaderName, request::Parts};

use super::header::AuthorizationHeader;
use super::provider::{Negotiation, NegotiationError, NegotiationProvider};
use crate::services::auth::principal::{IdentityGroup, NegotiatedIdentity};

pub const DEFAULT_GUEST_ACCOUNT: &str = "Guest";

#[derive(Debug, Clone)]
pub struct TrustedHeaderProvider {
    protocols: Vec<String>,
    user_header: HeaderName,
    sid_header: HeaderName,
    groups_header: HeaderName,
    guest_account: String,
}

impl TrustedHeaderProvider {
    pub fn new(
        protocols: Vec<String>,
        user_header: HeaderName,
        sid_header: HeaderName,
        groups_header: HeaderName,
    ) -> Self {
        Self {
            protocols,
            user_header,
            sid_header,
            groups_header,
            guest_account: DEFAULT_GUEST_ACCOUNT.to_string(),
        }
    }

    pub fn with_guest_account(mut self, account: impl Into<String>) -> Self {
        self.guest_account = account.into();
        self
    }

    fn header_str<'a>(headers: &'a HeaderMap, name: &HeaderName) -> Option<&'a str> {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    }

    fn supports(&self, package: &str) -> bool {
        self.protocols.iter().any(|p| p.eq_ignore_ascii_case(package))
    }

    fn is_guest(&self, fqn: &str) -> bool {
        let account = fqn.rsplit('\\').next().unwrap_or(fqn);
        account.eq_ignore_ascii_case(&self.guest_account)
    }

    fn identity(&self, headers: &HeaderMap, fqn: &str) -> NegotiatedIdentity {
        let mut identity = NegotiatedIdentity::new(fqn);
        if let Some(sid) = Self::header_str(headers, &self.sid_header) {
            identity = identity.with_sid(sid);
        }
        if let Some(groups) = Self::header_str(headers, &self.groups_header) {
            for group in parse_groups(groups) {
                identity = identity.with_group(group);
            }
        }
        if self.is_guest(fqn) {
            identity = identity.guest();
        }
        identity
    }
}

fn parse_groups(raw: &str) -> impl Iterator<Item = IdentityGroup> + '_ {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|entry| match entry.split_once('|') {
            Some((fqn, sid)) if !sid.trim().is_empty() => {
                IdentityGroup::new(fqn.trim()).with_sid(sid.trim())
            }
            Some((fqn, _)) => IdentityGroup::new(fqn.trim()),
            None => IdentityGroup::new(entry),
        })
}

#[async_trait]
impl NegotiationProvider for TrustedHeaderProvider {
    fn protocols(&self) -> &[String] {
        &self.protocols
    }

    fn accepts(&self, request: &Parts) -> bool {
        if Self::header_str(&request.headers, &self.user_header).is_some() {
            return true;
        }
        matches!(
            AuthorizationHeader::from_headers(&request.headers),
            Ok(Some(header)) if header.is_negotiate_or_ntlm()
        )
    }

    async fn negotiate(&self, request: &Parts) -> Result<Negotiation, NegotiationError> {
        if let Some(fqn) = Self::header_str(&request.headers, &self.user_header) {
            tracing::debug!(user = %fqn, "trusted upstream identity");
            return Ok(Negotiation::Complete(self.identity(&request.headers, fqn)));
        }

        let header = AuthorizationHeader::from_headers(&request.headers)?.ok_or_else(|| {
            NegotiationError::Handshake("no credentials on request".to_string())
        })?;
        let package = header.security_package()?;
        if !self.supports(package) {
            return Err(NegotiationError::UnsupportedPackage(package.to_string()));
        }

        tracing::debug!(
            package = %package,
            ntlm_type1 = header.is_ntlm_type1_message(),
            spnego_init = header.is_spnego_init_message(),
            "security package token without upstream assertion"
        );
        Err(NegotiationError::Handshake(format!(
            "{package} token reached the service without an upstream assertion"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{Request, header};

    fn provider() -> TrustedHeaderProvider {
        TrustedHeaderProvider::new(
            vec!["Negotiate".to_string(), "NTLM".to_string()],
            HeaderName::from_static("x-remote-user"),
            HeaderName::from_static("x-remote-sid"),
            HeaderName::from_static("x-remote-groups"),
        )
    }

    fn parts(headers: &[(&str, &str)]) -> Parts {
        let mut builder = Request::builder().uri("/whoami");
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn accepts_trusted_user_or_negotiate_header() {
        let provider = provider();
        assert!(provider.accepts(&parts(&[("x-remote-user", "CORP\\alice")])));
        assert!(provider.accepts(&parts(&[(header::AUTHORIZATION.as_str(), "NTLM TlRMTVNTUAAB")])));
        assert!(!provider.accepts(&parts(&[(header::AUTHORIZATION.as_str(), "Bearer abc")])));
        assert!(!provider.accepts(&parts(&[])));
    }

    #[tokio::test]
    async fn builds_identity_from_trusted_headers() {
        let request = parts(&[
            ("x-remote-user", "CORP\\alice"),
            ("x-remote-sid", "S-1-5-21-1-1001"),
            ("x-remote-groups", "CORP\\Admins|S-1-5-21-1-512, Everyone ,"),
        ]);

        let Negotiation::Complete(identity) = provider().negotiate(&request).await.unwrap() else {
            panic!("expected completed negotiation");
        };
        assert_eq!(
            identity,
            NegotiatedIdentity::new("CORP\\alice")
                .with_sid("S-1-5-21-1-1001")
                .with_group(IdentityGroup::new("CORP\\Admins").with_sid("S-1-5-21-1-512"))
                .with_group(IdentityGroup::new("Everyone"))
        );
    }

    #[tokio::test]
    async fn guest_account_is_flagged() {
        let request = parts(&[("x-remote-user", "CORP\\guest")]);
        let Negotiation::Complete(identity) = provider().negotiate(&request).await.unwrap() else {
            panic!("expected completed negotiation");
        };
        assert!(identity.is_guest());
    }

    #[tokio::test]
    async fn bare_token_without_assertion_fails() {
        let request = parts(&[(header::AUTHORIZATION.as_str(), "Negotiate YIIBAA==")]);
        let err = provider().negotiate(&request).await.unwrap_err();
        assert!(matches!(err, NegotiationError::Handshake(_)));
    }

    #[tokio::test]
    async fn unsupported_package_is_rejected() {
        let provider = TrustedHeaderProvider::new(
            vec!["Negotiate".to_string()],
            HeaderName::from_static("x-remote-user"),
            HeaderName::from_static("x-remote-sid"),
            HeaderName::from_static("x-remote-groups"),
        );
        let request = parts(&[(header::AUTHORIZATION.as_str(), "NTLM TlRMTVNTUAAB")]);
        let err = provider.negotiate(&request).await.unwrap_err();
        assert!(matches!(err, NegotiationError::UnsupportedPackage(p) if p == "NTLM"));
    }
}
