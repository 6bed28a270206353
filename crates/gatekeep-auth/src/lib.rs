//! Stateless token lifecycle: issuance, verification and refresh of
//! short-lived access credentials.

pub mod clock;
pub mod config;
pub mod gate;
pub mod identity;
pub mod issuer;
pub mod jwt;
pub mod keys;
pub mod password;
pub mod refresh;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{ConfigError, TokenConfig, MAX_LIFETIME_SECS};
pub use gate::{AccessGate, GateDecision, RejectReason};
pub use identity::{
    IdentityError, IdentityStore, InMemoryIdentityStore, LoginCredentials, Principal,
};
pub use issuer::{CredentialIssuer, IssuedCredentials, LoginError};
pub use jwt::{ClaimSet, JwtClaims, JwtError, TokenSigner};
pub use keys::{TokenKeys, TokenKind};
pub use password::{hash_password, verify_password, PasswordError};
pub use refresh::{RefreshError, RefreshExchanger, RefreshedAccess};
