/*!
 * Current principal extractor
 *
 * Responsibility:
 * - Hand the principal published by the negotiate middleware to handlers
 *
 * Public API:
 * - CurrentPrincipal
 */

mod core;

pub use core::CurrentPrincipal;
