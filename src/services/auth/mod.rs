pub mod authority;
pub mod challenge;
pub mod context;
pub mod delegator;
pub mod factory;
pub mod hooks;
pub mod negotiate;
pub mod principal;

pub use authority::{
    AccessDeniedError, AuthenticationError, Authority, AuthorityError, AuthorizationOutcome,
    RoleGateAuthority,
};
pub use context::SecurityContext;
pub use delegator::{ConfigurationError, Delegation, DelegatingNegotiateFilter};
pub use factory::build_filter;
pub use hooks::{AccessDeniedHook, FailureHook, HookError, HookSet, SuccessHook};
pub use negotiate::{Negotiation, NegotiationError, NegotiationProvider, TrustedHeaderProvider};
pub use principal::{NegotiatedIdentity, Principal, PrincipalPolicy};
