use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::response::Response;

use crate::services::auth::{Principal, SecurityContext};
use crate::state::AppState;

/// Extractor for the principal of an authenticated request.
/// Relies on the negotiate middleware having stored a `SecurityContext` in
/// request extensions. An anonymous or missing context is answered with the
/// negotiate challenge (401, one `WWW-Authenticate` per protocol, keep-alive)
/// so the client starts the handshake.
#[derive(Debug, Clone)]
pub struct CurrentPrincipal(pub Principal);

impl FromRequestParts<AppState> for CurrentPrincipal {
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<SecurityContext>()
            .and_then(SecurityContext::principal)
            .cloned()
            .map(CurrentPrincipal)
            .ok_or_else(|| state.filter.send_unauthorized(false))
    }
}
