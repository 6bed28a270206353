//! Refresh exchange: trade a valid refresh token for a new access token

use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

use crate::jwt::JwtError;
use crate::keys::{TokenKeys, TokenKind};

#[derive(Debug, Error)]
pub enum RefreshError {
    /// The refresh token was expired or invalid; only a full login recovers
    #[error("Refresh token rejected")]
    RefreshFailure,

    #[error("Failed to sign access token: {0}")]
    Signing(#[source] JwtError),
}

#[derive(Debug, Clone)]
pub struct RefreshedAccess {
    pub access_token: String,
}

/// Mints access tokens from the claims carried by a refresh token.
///
/// The identity store is not consulted, and the refresh token stays valid
/// until its own expiry.
pub struct RefreshExchanger {
    keys: Arc<TokenKeys>,
}

impl RefreshExchanger {
    pub fn new(keys: Arc<TokenKeys>) -> Self {
        Self { keys }
    }

    pub fn refresh(&self, refresh_token: &str) -> Result<RefreshedAccess, RefreshError> {
        let claims = self
            .keys
            .verify(TokenKind::Refresh, refresh_token)
            .map_err(|e| {
                warn!("Refresh rejected: {}", e);
                RefreshError::RefreshFailure
            })?;

        let access_token = self
            .keys
            .issue(TokenKind::Access, &claims)
            .map_err(RefreshError::Signing)?;

        debug!("Refreshed access token for principal {}", claims.id);

        Ok(RefreshedAccess { access_token })
    }
}
