//! Access gate middleware
//!
//! Reads the access token from the transport, runs it through the
//! [`AccessGate`](gatekeep_auth::AccessGate) and either attaches a [`Session`]
//! to the request or rejects it. Expired tokens get `410 Gone` so clients
//! know to call the refresh endpoint; every other rejection is `401`.

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
};
use gatekeep_auth::{ClaimSet, GateDecision, RejectReason};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

use crate::cookies::extract_access_token;
use crate::models::{api_error, ApiError};
use crate::AppState;

/// Decoded claims of the caller, valid for the current request only
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub email: String,
}

impl From<ClaimSet> for Session {
    fn from(claims: ClaimSet) -> Self {
        Self {
            id: claims.id,
            email: claims.email,
        }
    }
}

/// Map a gate rejection onto an HTTP response. The body `code` is the
/// reason's wire code.
pub fn rejection(reason: RejectReason) -> ApiError {
    let (status, message) = match reason {
        RejectReason::MissingCredential => (
            StatusCode::UNAUTHORIZED,
            "Missing access token (cookie or Authorization header)",
        ),
        RejectReason::Expired => (StatusCode::GONE, "Access token expired, refresh and retry"),
        RejectReason::Invalid => (
            StatusCode::UNAUTHORIZED,
            "Invalid access token, please log in again",
        ),
    };

    api_error(status, message, reason.as_str())
}

pub async fn require_access(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_access_token(request.headers());

    match state.gate.check(token.as_deref()) {
        GateDecision::Admitted(claims) => {
            request.extensions_mut().insert(Session::from(claims));
            Ok(next.run(request).await)
        }
        GateDecision::Rejected(reason) => {
            debug!("Rejected {} {}: {}", request.method(), request.uri().path(), reason);
            Err(rejection(reason))
        }
    }
}
