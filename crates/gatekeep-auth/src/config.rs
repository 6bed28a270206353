//! Token configuration: one secret and one lifetime per token kind

use chrono::Duration;
use std::fmt;
use thiserror::Error;

/// Upper bound on either token lifetime, in seconds (365 days)
pub const MAX_LIFETIME_SECS: i64 = 365 * 24 * 60 * 60;

/// Configuration errors, raised once at process start
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} secret must not be empty")]
    EmptySecret(&'static str),

    #[error("access and refresh secrets must differ")]
    SharedSecret,

    #[error("{0} lifetime must be positive")]
    NonPositiveLifetime(&'static str),

    #[error("{0} lifetime must not exceed {max}s", max = MAX_LIFETIME_SECS)]
    LifetimeTooLong(&'static str),

    #[error("access lifetime ({access}s) must be shorter than refresh lifetime ({refresh}s)")]
    LifetimeOrder { access: i64, refresh: i64 },
}

/// Validated, immutable token configuration
#[derive(Clone)]
pub struct TokenConfig {
    access_secret: Vec<u8>,
    refresh_secret: Vec<u8>,
    access_lifetime: Duration,
    refresh_lifetime: Duration,
}

impl TokenConfig {
    pub fn new(
        access_secret: impl Into<Vec<u8>>,
        refresh_secret: impl Into<Vec<u8>>,
        access_lifetime: Duration,
        refresh_lifetime: Duration,
    ) -> Result<Self, ConfigError> {
        let access_secret = access_secret.into();
        let refresh_secret = refresh_secret.into();

        if access_secret.is_empty() {
            return Err(ConfigError::EmptySecret("access"));
        }
        if refresh_secret.is_empty() {
            return Err(ConfigError::EmptySecret("refresh"));
        }
        if access_secret == refresh_secret {
            return Err(ConfigError::SharedSecret);
        }
        if access_lifetime <= Duration::zero() {
            return Err(ConfigError::NonPositiveLifetime("access"));
        }
        if refresh_lifetime <= Duration::zero() {
            return Err(ConfigError::NonPositiveLifetime("refresh"));
        }
        if access_lifetime.num_seconds() > MAX_LIFETIME_SECS {
            return Err(ConfigError::LifetimeTooLong("access"));
        }
        if refresh_lifetime.num_seconds() > MAX_LIFETIME_SECS {
            return Err(ConfigError::LifetimeTooLong("refresh"));
        }
        if access_lifetime >= refresh_lifetime {
            return Err(ConfigError::LifetimeOrder {
                access: access_lifetime.num_seconds(),
                refresh: refresh_lifetime.num_seconds(),
            });
        }

        Ok(Self {
            access_secret,
            refresh_secret,
            access_lifetime,
            refresh_lifetime,
        })
    }

    pub fn access_secret(&self) -> &[u8] {
        &self.access_secret
    }

    pub fn refresh_secret(&self) -> &[u8] {
        &self.refresh_secret
    }

    pub fn access_lifetime(&self) -> Duration {
        self.access_lifetime
    }

    pub fn refresh_lifetime(&self) -> Duration {
        self.refresh_lifetime
    }
}

impl fmt::Debug for TokenConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenConfig")
            .field("access_secret", &"<redacted>")
            .field("refresh_secret", &"<redacted>")
            .field("access_lifetime", &self.access_lifetime)
            .field("refresh_lifetime", &self.refresh_lifetime)
            .finish()
    }
}
