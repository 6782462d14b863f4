//! Password hashing (argon2id) with a tunable work factor.

use crate::error::{AppError, AppResult};
use argon2::{
    password_hash::{
        rand_core::OsRng, Error as PasswordHashError, PasswordHash, PasswordHasher,
        PasswordVerifier, SaltString,
    },
    Algorithm, Argon2, Params, Version,
};

/// One-way salted password hashing. Verification reads its parameters from the
/// stored PHC string, so raising the cost keeps older hashes valid.
#[derive(Clone)]
pub struct CredentialHasher {
    argon2: Argon2<'static>,
}

impl CredentialHasher {
    /// `cost` is the argon2 time cost (iterations).
    pub fn new(cost: u32) -> AppResult<Self> {
        let params = Params::new(Params::DEFAULT_M_COST, cost, Params::DEFAULT_P_COST, None)
            .map_err(|e| AppError::Config(format!("argon2 params: {}", e)))?;
        Ok(Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        })
    }

    pub fn hash(&self, password: &str) -> AppResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AppError::Hashing(e.to_string()))?
            .to_string();
        Ok(hash)
    }

    /// `Ok(false)` on mismatch; `Err` only when the stored hash cannot be used.
    pub fn verify(&self, password: &str, hash: &str) -> AppResult<bool> {
        let parsed =
            PasswordHash::new(hash).map_err(|e| AppError::Hashing(format!("parse hash: {}", e)))?;
        match self.argon2.verify_password(password.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(PasswordHashError::Password) => Ok(false),
            Err(e) => Err(AppError::Hashing(e.to_string())),
        }
    }
}

impl Default for CredentialHasher {
    fn default() -> Self {
        Self {
            argon2: Argon2::default(),
        }
    }
}
