//! Access gate: admit or reject one protected call based on its access token

use std::fmt;
use std::sync::Arc;
use tracing::debug;

use crate::jwt::{ClaimSet, JwtError};
use crate::keys::{TokenKeys, TokenKind};

/// Why a call was rejected. `Expired` asks the caller to refresh;
/// the others ask it to log in again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    MissingCredential,
    Expired,
    Invalid,
}

impl RejectReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            RejectReason::MissingCredential => "missing_credential",
            RejectReason::Expired => "expired",
            RejectReason::Invalid => "invalid",
        }
    }

    /// Whether the caller can recover by exchanging its refresh token
    pub fn is_refreshable(&self) -> bool {
        matches!(self, RejectReason::Expired)
    }
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Final state of a gate check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    Admitted(ClaimSet),
    Rejected(RejectReason),
}

impl GateDecision {
    pub fn into_result(self) -> Result<ClaimSet, RejectReason> {
        match self {
            GateDecision::Admitted(claims) => Ok(claims),
            GateDecision::Rejected(reason) => Err(reason),
        }
    }
}

pub struct AccessGate {
    keys: Arc<TokenKeys>,
}

impl AccessGate {
    pub fn new(keys: Arc<TokenKeys>) -> Self {
        Self { keys }
    }

    /// Decide on a single call. No retries, no side effects.
    pub fn check(&self, token: Option<&str>) -> GateDecision {
        let Some(token) = token.filter(|t| !t.is_empty()) else {
            debug!("Gate: no access token");
            return GateDecision::Rejected(RejectReason::MissingCredential);
        };

        match self.keys.verify(TokenKind::Access, token) {
            Ok(claims) => GateDecision::Admitted(claims),
            Err(JwtError::Expired) => {
                debug!("Gate: access token expired");
                GateDecision::Rejected(RejectReason::Expired)
            }
            Err(e) => {
                debug!("Gate: access token invalid: {}", e);
                GateDecision::Rejected(RejectReason::Invalid)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::config::TokenConfig;
    use crate::jwt::TokenSigner;
    use chrono::Duration;

    fn setup() -> (AccessGate, Arc<TokenKeys>, Arc<ManualClock>) {
        let config = TokenConfig::new(
            "access-secret",
            "refresh-secret",
            Duration::hours(1),
            Duration::hours(2),
        )
        .unwrap();
        let clock = Arc::new(ManualClock::starting_now());
        let keys = Arc::new(TokenKeys::with_clock(&config, clock.clone()));
        (AccessGate::new(keys.clone()), keys, clock)
    }

    #[test]
    fn test_missing_token() {
        let (gate, _, _) = setup();
        assert_eq!(
            gate.check(None),
            GateDecision::Rejected(RejectReason::MissingCredential)
        );
        assert_eq!(
            gate.check(Some("")),
            GateDecision::Rejected(RejectReason::MissingCredential)
        );
    }

    #[test]
    fn test_valid_token_admitted_with_claims() {
        let (gate, keys, _) = setup();
        let claims = ClaimSet::new("u1", "a@b.com");
        let token = keys.issue(TokenKind::Access, &claims).unwrap();

        assert_eq!(gate.check(Some(&token)), GateDecision::Admitted(claims));
    }

    #[test]
    fn test_expired_token() {
        let (gate, keys, clock) = setup();
        let token = keys
            .issue(TokenKind::Access, &ClaimSet::new("u1", "a@b.com"))
            .unwrap();

        clock.advance(Duration::hours(1) + Duration::seconds(1));

        let decision = gate.check(Some(&token));
        assert_eq!(decision, GateDecision::Rejected(RejectReason::Expired));
        assert!(decision.into_result().unwrap_err().is_refreshable());
    }

    #[test]
    fn test_wrong_secret_and_refresh_token_are_invalid() {
        let (gate, keys, _) = setup();
        let claims = ClaimSet::new("u1", "a@b.com");

        let foreign = TokenSigner::new(b"someone-else", Duration::hours(1))
            .issue(&claims)
            .unwrap();
        let refresh = keys.issue(TokenKind::Refresh, &claims).unwrap();

        assert_eq!(
            gate.check(Some(&foreign)),
            GateDecision::Rejected(RejectReason::Invalid)
        );
        assert_eq!(
            gate.check(Some(&refresh)),
            GateDecision::Rejected(RejectReason::Invalid)
        );
        assert_eq!(
            gate.check(Some("garbage")),
            GateDecision::Rejected(RejectReason::Invalid)
        );
    }

    #[test]
    fn test_reason_codes() {
        assert_eq!(RejectReason::MissingCredential.as_str(), "missing_credential");
        assert_eq!(RejectReason::Expired.to_string(), "expired");
        assert_eq!(RejectReason::Invalid.as_str(), "invalid");
        assert!(!RejectReason::Invalid.is_refreshable());
    }
}
