//! Bearer token issue, verification and expiry extraction for revocation (HS256 JWT).

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use uuid::Uuid;

use crate::config::AuthConfig;

const BEARER_PREFIX: &str = "Bearer ";

/// Claims carried by every issued token. Any other shape is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Claims {
    pub id: Uuid,
    pub email: String,
    pub exp: i64,
    pub iat: i64,
}

/// The only claim revocation needs. Other claims are ignored, so any token
/// carrying a numeric `exp` can be put on the deny-list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct ExpiryClaim {
    pub exp: i64,
}

impl ExpiryClaim {
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.exp, 0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("malformed token")]
    Malformed,
    #[error("token claims missing or mistyped")]
    MissingClaim,
    #[error("invalid token signature")]
    InvalidSignature,
    #[error("token expired")]
    Expired,
    #[error("token signing failed: {0}")]
    Signing(String),
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(e: jsonwebtoken::errors::Error) -> Self {
        match e.kind() {
            ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => {
                TokenError::InvalidSignature
            }
            ErrorKind::ExpiredSignature => TokenError::Expired,
            ErrorKind::MissingRequiredClaim(_) | ErrorKind::Json(_) => TokenError::MissingClaim,
            _ => TokenError::Malformed,
        }
    }
}

/// Signs and reads bearer tokens with a server-held symmetric key.
#[derive(Clone)]
pub struct TokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    has_key: bool,
    ttl: Duration,
    verify_on_revoke: bool,
}

impl TokenCodec {
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(&config.signing_key),
            decoding: DecodingKey::from_secret(&config.signing_key),
            has_key: !config.signing_key.is_empty(),
            ttl: config.token_ttl,
            verify_on_revoke: config.verify_logout_signature,
        }
    }

    pub fn issue(
        &self,
        user_id: Uuid,
        email: &str,
        now: DateTime<Utc>,
    ) -> Result<String, TokenError> {
        if !self.has_key {
            return Err(TokenError::Signing("signing key is empty".to_string()));
        }
        let claims = Claims {
            id: user_id,
            email: email.to_string(),
            exp: (now + self.ttl).timestamp(),
            iat: now.timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    /// Full check: HS256 signature, claim shape, and expiry against `now`.
    pub fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, TokenError> {
        // Expiry is compared against the caller's clock below, without leeway.
        let claims = decode::<Claims>(token, &self.decoding, &expiry_only())?.claims;
        if now.timestamp() >= claims.exp {
            return Err(TokenError::Expired);
        }
        Ok(claims)
    }

    /// Read `exp` without checking signature or expiry.
    pub fn parse_claims_unverified(&self, token: &str) -> Result<ExpiryClaim, TokenError> {
        let mut validation = expiry_only();
        validation.insecure_disable_signature_validation();
        let data = decode::<ExpiryClaim>(token, &DecodingKey::from_secret(&[]), &validation)?;
        Ok(data.claims)
    }

    /// Read `exp` from a token signed with our key. Expiry itself is not
    /// checked, so an expired token still yields its claim.
    pub fn parse_claims_signed(&self, token: &str) -> Result<ExpiryClaim, TokenError> {
        let data = decode::<ExpiryClaim>(token, &self.decoding, &expiry_only())?;
        Ok(data.claims)
    }

    /// How long a token being revoked must stay on the deny-list. Unless
    /// disabled in [`AuthConfig`], only tokens we signed are accepted.
    pub fn revocation_expiry(&self, token: &str) -> Result<DateTime<Utc>, TokenError> {
        let claim = if self.verify_on_revoke {
            self.parse_claims_signed(token)?
        } else {
            self.parse_claims_unverified(token)?
        };
        claim.expires_at().ok_or(TokenError::MissingClaim)
    }
}

fn expiry_only() -> Validation {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = false;
    validation.required_spec_claims = HashSet::from(["exp".to_string()]);
    validation
}

/// Extract the token from an `Authorization` header value.
pub fn strip_bearer(value: &str) -> Option<&str> {
    value
        .strip_prefix(BEARER_PREFIX)
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Short, non-reversible token identifier for log lines.
pub fn token_fingerprint(token: &str) -> String {
    let digest = Sha256::digest(token.as_bytes());
    hex::encode(&digest[..6])
}
