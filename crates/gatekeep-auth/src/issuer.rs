//! Credential issuance: identity check, then an access/refresh token pair

use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

use crate::identity::{IdentityError, IdentityStore, LoginCredentials};
use crate::jwt::{ClaimSet, JwtError};
use crate::keys::{TokenKeys, TokenKind};

/// Login failures
#[derive(Debug, Error)]
pub enum LoginError {
    /// Credentials did not match. Deliberately says nothing about why.
    #[error("Invalid email or password")]
    AuthFailure,

    #[error(transparent)]
    IdentityStore(#[from] IdentityError),

    #[error("Failed to sign {kind} token: {source}")]
    Signing {
        kind: TokenKind,
        #[source]
        source: JwtError,
    },
}

/// Outcome of a successful login
#[derive(Debug, Clone)]
pub struct IssuedCredentials {
    pub claims: ClaimSet,
    pub access_token: String,
    pub refresh_token: String,
}

/// Issues token pairs. Records nothing about what it issued.
pub struct CredentialIssuer {
    store: Arc<dyn IdentityStore>,
    keys: Arc<TokenKeys>,
}

impl CredentialIssuer {
    pub fn new(store: Arc<dyn IdentityStore>, keys: Arc<TokenKeys>) -> Self {
        Self { store, keys }
    }

    pub async fn login(
        &self,
        credentials: &LoginCredentials,
    ) -> Result<IssuedCredentials, LoginError> {
        let principal = match self.store.check_credentials(credentials).await? {
            Some(principal) => principal,
            None => {
                warn!("Login rejected");
                return Err(LoginError::AuthFailure);
            }
        };

        let claims = ClaimSet::from(&principal);
        let access_token = self.sign(TokenKind::Access, &claims)?;
        let refresh_token = self.sign(TokenKind::Refresh, &claims)?;

        debug!("Issued token pair for principal {}", claims.id);

        Ok(IssuedCredentials {
            claims,
            access_token,
            refresh_token,
        })
    }

    fn sign(&self, kind: TokenKind, claims: &ClaimSet) -> Result<String, LoginError> {
        self.keys
            .issue(kind, claims)
            .map_err(|source| LoginError::Signing { kind, source })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TokenConfig;
    use crate::identity::{MockIdentityStore, Principal};
    use chrono::Duration;

    fn keys() -> Arc<TokenKeys> {
        let config = TokenConfig::new(
            "access-secret",
            "refresh-secret",
            Duration::hours(1),
            Duration::hours(2),
        )
        .unwrap();
        Arc::new(TokenKeys::new(&config))
    }

    #[tokio::test]
    async fn test_login_issues_pair_with_same_claims() {
        let mut store = MockIdentityStore::new();
        store
            .expect_check_credentials()
            .withf(|c| c.email == "a@b.com" && c.password == "pw")
            .times(1)
            .returning(|_| {
                Ok(Some(Principal {
                    id: "u1".to_string(),
                    email: "a@b.com".to_string(),
                }))
            });

        let keys = keys();
        let issuer = CredentialIssuer::new(Arc::new(store), keys.clone());
        let issued = issuer
            .login(&LoginCredentials::new("a@b.com", "pw"))
            .await
            .unwrap();

        let expected = ClaimSet::new("u1", "a@b.com");
        assert_eq!(issued.claims, expected);
        assert_ne!(issued.access_token, issued.refresh_token);
        assert_eq!(
            keys.verify(TokenKind::Access, &issued.access_token).unwrap(),
            expected
        );
        assert_eq!(
            keys.verify(TokenKind::Refresh, &issued.refresh_token)
                .unwrap(),
            expected
        );
    }

    #[tokio::test]
    async fn test_login_mismatch_is_auth_failure() {
        let mut store = MockIdentityStore::new();
        store
            .expect_check_credentials()
            .returning(|_| Ok(None));

        let issuer = CredentialIssuer::new(Arc::new(store), keys());
        let result = issuer
            .login(&LoginCredentials::new("a@b.com", "wrong"))
            .await;

        assert!(matches!(result, Err(LoginError::AuthFailure)));
    }

    #[tokio::test]
    async fn test_store_outage_is_not_auth_failure() {
        let mut store = MockIdentityStore::new();
        store
            .expect_check_credentials()
            .returning(|_| Err(IdentityError::Unavailable("connection refused".to_string())));

        let issuer = CredentialIssuer::new(Arc::new(store), keys());
        let result = issuer.login(&LoginCredentials::new("a@b.com", "pw")).await;

        assert!(matches!(result, Err(LoginError::IdentityStore(_))));
    }
}
