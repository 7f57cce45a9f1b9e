//! Negotiate authentication → SecurityContext in request extensions.
//!
//! Per request:
//! - no credentials the provider handles → pass through with an empty context
//! - handshake needs another leg → return the provider's challenge
//! - provider error / rejected guest → generic 401 challenge (connection close)
//! - completed identity → `DelegatingNegotiateFilter::delegate`; only an accepted
//!   delegation reaches the inner service

use axum::{
    Router,
    body::Body,
    extract::State,
    http::Request,
    middleware::{self, Next},
    response::Response,
};
use tracing::{debug, trace, warn};

use crate::services::auth::{Delegation, Negotiation, Principal, SecurityContext};
use crate::state::AppState;

/// Put negotiate authentication in front of `router`.
///
/// ```ignore
/// let protected = Router::new().route("/whoami", get(whoami));
/// let protected = middleware::negotiate::apply(protected, state.clone());
/// ```
pub fn apply(router: Router<AppState>, state: AppState) -> Router<AppState> {
    router.route_layer(middleware::from_fn_with_state(state, negotiate_middleware))
}

async fn negotiate_middleware(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let filter = state.filter.as_ref();

    let Some(provider) = filter.provider() else {
        // validate_configuration() runs at startup, so this is a wiring bug
        warn!("negotiate middleware reached without a provider");
        return filter.send_unauthorized(true);
    };

    let (parts, body) = req.into_parts();

    if !provider.accepts(&parts) {
        debug!(uri = %parts.uri, "no negotiate credentials, continuing anonymously");
        let mut req = Request::from_parts(parts, body);
        req.extensions_mut().insert(SecurityContext::new());
        return next.run(req).await;
    }

    let identity = match provider.negotiate(&parts).await {
        Ok(Negotiation::Complete(identity)) => identity,
        Ok(Negotiation::Continue(challenge)) => {
            debug!("continue token sent, waiting for next negotiation leg");
            return challenge;
        }
        Err(err) => {
            warn!(error = %err, "error logging in user");
            trace!(error = ?err, "negotiation failure");
            return filter.send_unauthorized(true);
        }
    };

    if identity.is_guest() && !filter.allow_guest_login() {
        warn!(user = %identity.fqn, "guest login disabled");
        return filter.send_unauthorized(true);
    }

    let principal = Principal::from_identity(&identity, filter.principal_policy());
    debug!(principal = %principal, roles = principal.roles().len(), "logged in user");

    let mut context = SecurityContext::new();
    match filter.delegate(&parts, &mut context, principal).await {
        Delegation::Rejected(response) => response,
        Delegation::Accepted { headers } => {
            let mut req = Request::from_parts(parts, body);
            // middleware → extractor
            req.extensions_mut().insert(context);

            let mut response = next.run(req).await;
            response.headers_mut().extend(headers);
            response
        }
    }
}
