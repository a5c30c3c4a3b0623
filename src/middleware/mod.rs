//! Middleware layer.
//!
//! Cross-cutting concerns applied by the dispatcher around every handler,
//! independent of which route (if any) matched.
//!
//! - [`cors`]: CORS response headers and `OPTIONS` pre-flight answers.

pub mod cors;

pub use cors::Cors;
