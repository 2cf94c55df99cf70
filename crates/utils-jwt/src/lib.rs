//! Session token signing and verification.
//!
//! Tokens are HS256 JWTs carrying the user id as `sub` and the user's role as a
//! private `role` claim. The role type is generic so this crate stays
//! independent from the database enums.

use chrono::{Duration, Utc};
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode,
    errors::ErrorKind,
};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum JwtError {
    #[error("token is missing")]
    Missing,
    #[error("token has expired")]
    Expired,
    #[error("token issuer does not match")]
    InvalidIssuer,
    #[error("token signature is invalid")]
    InvalidSignature,
    #[error("token is malformed: {0}")]
    Malformed(String),
    #[error("failed to sign token: {0}")]
    Signing(String),
}

impl JwtError {
    /// Short machine-readable reason, used in logs.
    pub fn reason(&self) -> &'static str {
        match self {
            JwtError::Missing => "missing_token",
            JwtError::Expired => "expired_token",
            JwtError::InvalidIssuer => "issuer_mismatch",
            JwtError::InvalidSignature => "invalid_signature",
            JwtError::Malformed(_) => "malformed_token",
            JwtError::Signing(_) => "signing_failed",
        }
    }
}

impl From<jsonwebtoken::errors::Error> for JwtError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            ErrorKind::ExpiredSignature => JwtError::Expired,
            ErrorKind::InvalidIssuer => JwtError::InvalidIssuer,
            ErrorKind::InvalidSignature => JwtError::InvalidSignature,
            _ => JwtError::Malformed(err.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessClaims<R> {
    pub sub: Uuid,
    pub role: R,
    pub iss: String,
    pub jti: Uuid,
    pub iat: i64,
    pub exp: i64,
}

impl<R> AccessClaims<R> {
    pub fn new(sub: Uuid, role: R, issuer: impl Into<String>, ttl: Duration) -> Self {
        let now = Utc::now();
        Self {
            sub,
            role,
            iss: issuer.into(),
            jti: Uuid::new_v4(),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        }
    }
}

/// Signing and verification keys bound to one issuer.
#[derive(Clone)]
pub struct TokenKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    issuer: String,
    ttl: Duration,
}

impl std::fmt::Debug for TokenKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenKeys")
            .field("issuer", &self.issuer)
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl TokenKeys {
    pub fn new(secret: &[u8], issuer: impl Into<String>, ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            issuer: issuer.into(),
            ttl,
        }
    }

    /// Issues a fresh token for `sub` valid for the configured lifetime.
    pub fn issue<R: Serialize>(&self, sub: Uuid, role: R) -> Result<String, JwtError> {
        let claims = AccessClaims::new(sub, role, self.issuer.clone(), self.ttl);
        self.sign(&claims)
    }

    pub fn sign<R: Serialize>(&self, claims: &AccessClaims<R>) -> Result<String, JwtError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding)
            .map_err(|err| JwtError::Signing(err.to_string()))
    }

    pub fn verify<R: DeserializeOwned>(&self, token: &str) -> Result<AccessClaims<R>, JwtError> {
        if token.trim().is_empty() {
            return Err(JwtError::Missing);
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[self.issuer.as_str()]);
        validation.set_required_spec_claims(&["exp", "iss", "sub"]);

        let data = decode::<AccessClaims<R>>(token, &self.decoding, &validation)?;
        Ok(data.claims)
    }
}
