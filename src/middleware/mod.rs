/*
 * Responsibility
 * - middleware public interface
 * - http::apply (request id / trace / limits), negotiate::apply (authentication)
 */
pub mod http;
pub mod negotiate;
