//! Data models for users and revoked tokens.

pub mod revoked_token;
pub mod user;

pub use revoked_token::*;
pub use user::*;
