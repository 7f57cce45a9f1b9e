//! Factory: build `DelegatingNegotiateFilter` from application `Config`.
use std::sync::Arc;

use crate::config::{AuthorityConfig, NegotiateConfig, ProviderKind};
use crate::services::auth::{
    DelegatingNegotiateFilter, PrincipalPolicy, RoleGateAuthority, TrustedHeaderProvider,
};

pub fn build_filter(
    negotiate: &NegotiateConfig,
    authority: &AuthorityConfig,
) -> DelegatingNegotiateFilter {
    let mut filter = DelegatingNegotiateFilter::new()
        .with_allow_guest_login(negotiate.allow_guest_login)
        .with_principal_policy(PrincipalPolicy {
            principal_format: negotiate.principal_format,
            role_format: negotiate.role_format,
            default_granted_authority: negotiate.default_granted_authority.clone(),
        });

    match negotiate.provider {
        ProviderKind::TrustedHeader => {
            // Any client that reaches the service directly can assert an identity.
            tracing::warn!(
                user_header = %negotiate.trusted_user_header,
                "trusted header provider selected; only the authenticating proxy may reach this service"
            );
            filter = filter.with_provider(Arc::new(TrustedHeaderProvider::new(
                negotiate.protocols.clone(),
                negotiate.trusted_user_header.clone(),
                negotiate.trusted_sid_header.clone(),
                negotiate.trusted_groups_header.clone(),
            )));
        }
        ProviderKind::None => {
            tracing::warn!("no negotiation provider configured");
        }
    }

    if let Some(role) = &authority.required_role {
        tracing::info!(required_role = %role, "role gate authority enabled");
        filter = filter.with_authority(Arc::new(
            RoleGateAuthority::new(role.clone()).with_denied_users(&authority.denied_users),
        ));
    }

    filter
}
