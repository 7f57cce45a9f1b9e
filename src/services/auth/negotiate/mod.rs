pub mod header;
pub mod provider;
pub mod trusted_header;

pub use header::{AuthorizationHeader, HeaderError};
pub use provider::{Negotiation, NegotiationError, NegotiationProvider};
pub use trusted_header::TrustedHeaderProvider;
