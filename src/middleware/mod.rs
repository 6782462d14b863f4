//! Middleware: admission for routes that need a live bearer token.

pub mod auth;

pub use auth::{require_auth, AuthUser};
