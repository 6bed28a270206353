//! Per-kind signers sharing one clock

use std::fmt;
use std::sync::Arc;

use crate::clock::{Clock, SystemClock};
use crate::config::TokenConfig;
use crate::jwt::{ClaimSet, JwtError, TokenSigner};

/// The two token kinds. They differ only in secret and lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Access,
    Refresh,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Access => write!(f, "access"),
            TokenKind::Refresh => write!(f, "refresh"),
        }
    }
}

/// Access and refresh signers, read-only for the lifetime of the process
pub struct TokenKeys {
    access: TokenSigner,
    refresh: TokenSigner,
    clock: Arc<dyn Clock>,
}

impl TokenKeys {
    pub fn new(config: &TokenConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: &TokenConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            access: TokenSigner::new(config.access_secret(), config.access_lifetime()),
            refresh: TokenSigner::new(config.refresh_secret(), config.refresh_lifetime()),
            clock,
        }
    }

    pub fn signer(&self, kind: TokenKind) -> &TokenSigner {
        match kind {
            TokenKind::Access => &self.access,
            TokenKind::Refresh => &self.refresh,
        }
    }

    pub fn issue(&self, kind: TokenKind, claims: &ClaimSet) -> Result<String, JwtError> {
        self.signer(kind).issue_at(claims, self.clock.now())
    }

    pub fn verify(&self, kind: TokenKind, token: &str) -> Result<ClaimSet, JwtError> {
        self.signer(kind).verify_at(token, self.clock.now())
    }
}
