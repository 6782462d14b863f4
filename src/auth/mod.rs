//! Authentication: password hashing, bearer tokens, register/login/logout.

mod handlers;
mod jwt;
mod password;

pub use handlers::{login, logout, register, LoginResponse, RegisterResponse};
pub(crate) use handlers::authorization;
pub use jwt::{strip_bearer, token_fingerprint, Claims, ExpiryClaim, TokenCodec, TokenError};
pub use password::CredentialHasher;
