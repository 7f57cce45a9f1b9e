/*
 * Responsibility
 * - v1 URL layout
 * - /health is public; everything else sits behind the negotiate middleware
 */
use axum::{Router, routing::get};

use crate::api::v1::handlers::{health::health, whoami::whoami};
use crate::middleware;
use crate::state::AppState;

pub fn routes(state: AppState) -> Router<AppState> {
    let protected = Router::new().route("/whoami", get(whoami));
    let protected = middleware::negotiate::apply(protected, state);

    Router::new().route("/health", get(health)).merge(protected)
}
