/*
 * Responsibility
 * - Shared context attached to the Router (AppState)
 * - Clone is cheap (Arc inside); the filter is read-only after startup
 */
use std::sync::Arc;

use crate::services::auth::DelegatingNegotiateFilter;

#[derive(Clone, Debug)]
pub struct AppState {
    pub filter: Arc<DelegatingNegotiateFilter>,
}

impl AppState {
    pub fn new(filter: DelegatingNegotiateFilter) -> Self {
        Self {
            filter: Arc::new(filter),
        }
    }
}
