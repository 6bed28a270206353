//! JWT (JSON Web Token) signing and verification
//!
//! Tokens are HS256-signed and carry the [`ClaimSet`] plus issue and expiry
//! timestamps. Verification distinguishes an expired token from every other
//! failure, since callers branch on it (refresh vs. re-authenticate).
//!
//! # Example
//!
//! ```
//! use chrono::Duration;
//! use gatekeep_auth::{ClaimSet, JwtError, TokenSigner};
//!
//! let signer = TokenSigner::new(b"access-secret", Duration::hours(1));
//! let token = signer.issue(&ClaimSet::new("u1", "a@b.com")).unwrap();
//!
//! assert_eq!(signer.verify(&token).unwrap().id, "u1");
//!
//! let other = TokenSigner::new(b"refresh-secret", Duration::hours(2));
//! assert!(matches!(other.verify(&token), Err(JwtError::InvalidSignature)));
//! ```

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Minimal identity payload embedded in every token
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClaimSet {
    /// Unique principal identifier
    pub id: String,
    /// Principal contact attribute
    pub email: String,
}

impl ClaimSet {
    /// Create a claim set for one principal
    pub fn new(id: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            email: email.into(),
        }
    }
}

/// Claims as they appear on the wire
///
/// The payload is the [`ClaimSet`] fields flattened next to the registered
/// `iat` and `exp` claims, both in whole seconds since the Unix epoch.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JwtClaims {
    /// Principal identifier
    pub id: String,
    /// Principal email
    pub email: String,
    /// Issued at (timestamp)
    pub iat: i64,
    /// Expiration time (timestamp)
    pub exp: i64,
}

impl JwtClaims {
    /// Build wire claims issued at `issued_at` and expiring `lifetime` later
    ///
    /// # Errors
    ///
    /// Returns [`JwtError::ExpiryOutOfRange`] when `issued_at + lifetime`
    /// does not fit in a timestamp.
    pub fn new(
        claims: &ClaimSet,
        issued_at: DateTime<Utc>,
        lifetime: Duration,
    ) -> Result<Self, JwtError> {
        let exp = issued_at
            .checked_add_signed(lifetime)
            .ok_or(JwtError::ExpiryOutOfRange)?;

        Ok(Self {
            id: claims.id.clone(),
            email: claims.email.clone(),
            iat: issued_at.timestamp(),
            exp: exp.timestamp(),
        })
    }

    /// Check expiry as of `now`. A token is still valid at exactly `exp`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now.timestamp() > self.exp
    }

    /// Strip the timestamps
    pub fn claim_set(&self) -> ClaimSet {
        ClaimSet::new(self.id.clone(), self.email.clone())
    }
}

/// JWT errors
#[derive(Debug, Error)]
pub enum JwtError {
    /// The library failed to encode the token
    #[error("JWT signing error: {0}")]
    Signing(#[source] jsonwebtoken::errors::Error),

    /// The lifetime pushes the expiry past the representable range
    #[error("Token expiry out of range")]
    ExpiryOutOfRange,

    /// Signature valid, but the token is past its expiry
    #[error("Token expired")]
    Expired,

    /// Bad signature, wrong secret, wrong algorithm or malformed token
    #[error("Invalid token signature")]
    InvalidSignature,
}

/// Signs and verifies tokens of one kind: one secret, one lifetime.
///
/// Holds no mutable state, so a single instance can be shared across
/// threads without coordination.
pub struct TokenSigner {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    lifetime: Duration,
}

impl TokenSigner {
    /// Create a signer using HMAC-SHA256 over `secret`
    pub fn new(secret: &[u8], lifetime: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked against our own clock after the signature passes,
        // so the two failure kinds never overlap.
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.validate_nbf = false;
        validation.leeway = 0;

        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            lifetime,
        }
    }

    /// Issue a token expiring `lifetime` from the current wall-clock time
    pub fn issue(&self, claims: &ClaimSet) -> Result<String, JwtError> {
        self.issue_at(claims, Utc::now())
    }

    /// Issue a token as if the current time were `now`
    ///
    /// # Errors
    ///
    /// [`JwtError::ExpiryOutOfRange`] if the lifetime overflows the expiry
    /// timestamp, [`JwtError::Signing`] if encoding fails.
    pub fn issue_at(&self, claims: &ClaimSet, now: DateTime<Utc>) -> Result<String, JwtError> {
        let claims = JwtClaims::new(claims, now, self.lifetime)?;
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(JwtError::Signing)
    }

    /// Verify a token against the current wall-clock time
    pub fn verify(&self, token: &str) -> Result<ClaimSet, JwtError> {
        self.verify_at(token, Utc::now())
    }

    /// Verify signature, then expiry as of `now`
    ///
    /// Any decoding failure is [`JwtError::InvalidSignature`]; only a token
    /// whose signature checks out can be reported as [`JwtError::Expired`].
    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<ClaimSet, JwtError> {
        let token_data = decode::<JwtClaims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| {
                debug!("Token rejected: {}", e);
                JwtError::InvalidSignature
            })?;

        if token_data.claims.is_expired_at(now) {
            return Err(JwtError::Expired);
        }

        Ok(token_data.claims.claim_set())
    }
}

/// Sign `claims` with `secret`, expiring `lifetime` from now
pub fn issue(claims: &ClaimSet, secret: &[u8], lifetime: Duration) -> Result<String, JwtError> {
    TokenSigner::new(secret, lifetime).issue(claims)
}

/// Verify `token` against `secret` at the current time
pub fn verify(token: &str, secret: &[u8]) -> Result<ClaimSet, JwtError> {
    TokenSigner::new(secret, Duration::zero()).verify(token)
}
