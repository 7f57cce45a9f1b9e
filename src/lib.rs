//! Delegating negotiate authentication for axum services.
//!
//! A negotiation provider yields a validated principal; the
//! [`DelegatingNegotiateFilter`](services::auth::DelegatingNegotiateFilter)
//! optionally re-authorizes it, publishes it to the request's
//! [`SecurityContext`](services::auth::SecurityContext) and turns authority
//! failures into exactly one response.

pub mod api;
pub mod app;
pub mod config;
pub mod error;
pub mod middleware;
pub mod services;
pub mod state;
