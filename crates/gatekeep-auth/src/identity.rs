//! Identity store capability consumed by the credential issuer

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;
use tracing::debug;

use crate::jwt::ClaimSet;
use crate::password::{hash_password, verify_password, PasswordError};

/// Login input as submitted by the caller
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginCredentials {
    pub email: String,
    pub password: String,
}

impl LoginCredentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

/// A principal as returned by the identity store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub id: String,
    pub email: String,
}

impl From<&Principal> for ClaimSet {
    fn from(principal: &Principal) -> Self {
        ClaimSet::new(principal.id.clone(), principal.email.clone())
    }
}

/// Store failures, distinct from a credential mismatch
#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("Identity store unavailable: {0}")]
    Unavailable(String),

    #[error(transparent)]
    Password(#[from] PasswordError),
}

/// Looks up a principal by login credentials.
///
/// Returns `Ok(None)` for any mismatch; implementations must not let callers
/// tell an unknown principal apart from a wrong password.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IdentityStore: Send + Sync {
    async fn check_credentials(
        &self,
        credentials: &LoginCredentials,
    ) -> Result<Option<Principal>, IdentityError>;
}

struct StoredPrincipal {
    principal: Principal,
    password_hash: String,
}

/// Password behind the decoy hash. Never belongs to a principal.
const DECOY_PASSWORD: &str = "gatekeep-decoy-password";

/// In-memory principals keyed by email, with Argon2id password hashes.
///
/// Unknown emails are checked against a decoy hash so that both kinds of
/// mismatch cost one Argon2 verification.
pub struct InMemoryIdentityStore {
    principals: HashMap<String, StoredPrincipal>,
    decoy_hash: String,
}

impl InMemoryIdentityStore {
    /// Create an empty store. Hashes the decoy password once.
    pub fn new() -> Result<Self, PasswordError> {
        Ok(Self {
            principals: HashMap::new(),
            decoy_hash: hash_password(DECOY_PASSWORD)?,
        })
    }

    /// Add a principal, hashing `password`. Replaces any entry with the same email.
    pub fn with_principal(
        mut self,
        id: impl Into<String>,
        email: impl Into<String>,
        password: &str,
    ) -> Result<Self, PasswordError> {
        let principal = Principal {
            id: id.into(),
            email: email.into(),
        };
        let password_hash = hash_password(password)?;

        self.principals.insert(
            principal.email.clone(),
            StoredPrincipal {
                principal,
                password_hash,
            },
        );
        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.principals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.principals.is_empty()
    }

    /// The principal registered under `email` with its hash, or no principal
    /// and the decoy hash
    fn candidate(&self, email: &str) -> (Option<&Principal>, &str) {
        match self.principals.get(email) {
            Some(stored) => (Some(&stored.principal), &stored.password_hash),
            None => (None, &self.decoy_hash),
        }
    }
}

#[async_trait]
impl IdentityStore for InMemoryIdentityStore {
    async fn check_credentials(
        &self,
        credentials: &LoginCredentials,
    ) -> Result<Option<Principal>, IdentityError> {
        let (principal, hash) = self.candidate(&credentials.email);
        let matched = verify_password(&credentials.password, hash)?;

        match principal {
            Some(principal) if matched => Ok(Some(principal.clone())),
            Some(_) => Ok(None),
            None => {
                debug!("No principal for submitted email");
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> InMemoryIdentityStore {
        InMemoryIdentityStore::new()
            .unwrap()
            .with_principal("u1", "a@b.com", "correct horse")
            .unwrap()
            .with_principal("u2", "c@d.com", "battery staple")
            .unwrap()
    }

    #[tokio::test]
    async fn test_matching_credentials() {
        let principal = store()
            .check_credentials(&LoginCredentials::new("c@d.com", "battery staple"))
            .await
            .unwrap();

        assert_eq!(
            principal,
            Some(Principal {
                id: "u2".to_string(),
                email: "c@d.com".to_string()
            })
        );
    }

    #[tokio::test]
    async fn test_wrong_password_and_unknown_email_look_the_same() {
        let store = store();

        let wrong_password = store
            .check_credentials(&LoginCredentials::new("a@b.com", "nope"))
            .await
            .unwrap();
        let unknown = store
            .check_credentials(&LoginCredentials::new("x@y.com", "correct horse"))
            .await
            .unwrap();

        assert_eq!(wrong_password, None);
        assert_eq!(unknown, None);
    }

    #[test]
    fn test_unknown_email_is_checked_against_decoy_hash() {
        let store = store();

        let (principal, hash) = store.candidate("x@y.com");
        assert!(principal.is_none());
        assert!(hash.starts_with("$argon2id$v=19$"));
        assert!(!verify_password("correct horse", hash).unwrap());

        let (principal, hash) = store.candidate("a@b.com");
        assert_eq!(principal.map(|p| p.id.as_str()), Some("u1"));
        assert_ne!(hash, store.decoy_hash);
    }

    #[tokio::test]
    async fn test_decoy_password_never_logs_in() {
        let principal = store()
            .check_credentials(&LoginCredentials::new("x@y.com", DECOY_PASSWORD))
            .await
            .unwrap();

        assert_eq!(principal, None);
    }

    #[test]
    fn test_principal_into_claims() {
        let principal = Principal {
            id: "u1".to_string(),
            email: "a@b.com".to_string(),
        };
        assert_eq!(ClaimSet::from(&principal), ClaimSet::new("u1", "a@b.com"));
    }

    #[test]
    fn test_store_size() {
        assert_eq!(store().len(), 2);
        assert!(InMemoryIdentityStore::new().unwrap().is_empty());
    }
}
