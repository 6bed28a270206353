use axum::{
    body::Bytes,
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Extension, Json,
};
use axum_extra::extract::cookie::CookieJar;
use gatekeep_auth::{LoginCredentials, LoginError, RefreshError};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::cookies::{cookie_value, ACCESS_TOKEN_COOKIE, REFRESH_TOKEN_COOKIE};
use crate::middleware::Session;
use crate::models::*;
use crate::AppState;

/// Log in and receive access and refresh cookies
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in; tokens set as cookies", body = LoginResponse),
        (status = 400, description = "Malformed request body", body = ErrorResponse),
        (status = 403, description = "Invalid email or password", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "auth"
)]
pub async fn login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<(CookieJar, Json<LoginResponse>), ApiError> {
    let Json(req) = payload.map_err(|e| {
        debug!("Malformed login body: {}", e);
        invalid_request()
    })?;
    let credentials = LoginCredentials::new(req.email, req.password);

    let issued = state.issuer.login(&credentials).await.map_err(|e| match e {
        LoginError::AuthFailure => api_error(
            StatusCode::FORBIDDEN,
            "Your email or password is incorrect",
            "AUTH_FAILED",
        ),
        other => {
            error!("Login failed: {}", other);
            internal_error()
        }
    })?;

    info!("Principal {} logged in", issued.claims.id);

    let jar = jar
        .add(state.cookies.access_cookie(issued.access_token))
        .add(state.cookies.refresh_cookie(issued.refresh_token));

    Ok((
        jar,
        Json(LoginResponse {
            id: issued.claims.id,
            email: issued.claims.email,
        }),
    ))
}

/// Clear both token cookies.
///
/// Nothing is recorded server-side: an outstanding refresh token stays
/// valid until its own expiry.
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    responses(
        (status = 200, description = "Cookies cleared", body = MessageResponse)
    ),
    tag = "auth"
)]
pub async fn logout(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> (CookieJar, Json<MessageResponse>) {
    debug!("Clearing token cookies");

    let jar = jar
        .add(state.cookies.removal_cookie(ACCESS_TOKEN_COOKIE))
        .add(state.cookies.removal_cookie(REFRESH_TOKEN_COOKIE));

    (
        jar,
        Json(MessageResponse {
            message: "Logged out".to_string(),
        }),
    )
}

/// Exchange a refresh token for a new access token.
///
/// The `refreshToken` body field wins; the `refreshToken` cookie is used
/// when the body is empty or omits it.
#[utoipa::path(
    post,
    path = "/api/auth/refresh",
    request_body(content = RefreshRequest, description = "Optional; falls back to the refreshToken cookie"),
    responses(
        (status = 200, description = "New access token", body = RefreshResponse),
        (status = 400, description = "Malformed request body", body = ErrorResponse),
        (status = 401, description = "Refresh token missing, expired or invalid", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "auth"
)]
pub async fn refresh(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    body: Bytes,
) -> Result<(CookieJar, Json<RefreshResponse>), ApiError> {
    let req = if body.is_empty() {
        RefreshRequest::default()
    } else {
        serde_json::from_slice::<RefreshRequest>(&body).map_err(|e| {
            debug!("Malformed refresh body: {}", e);
            invalid_request()
        })?
    };

    let refresh_token = req
        .refresh_token
        .filter(|t| !t.is_empty())
        .or_else(|| cookie_value(&jar, REFRESH_TOKEN_COOKIE))
        .ok_or_else(|| {
            warn!("Refresh attempted without a refresh token");
            refresh_failed()
        })?;

    let refreshed = state
        .exchanger
        .refresh(&refresh_token)
        .map_err(|e| match e {
            RefreshError::RefreshFailure => refresh_failed(),
            RefreshError::Signing(e) => {
                error!("Refresh failed: {}", e);
                internal_error()
            }
        })?;

    let jar = jar.add(state.cookies.access_cookie(refreshed.access_token.clone()));

    Ok((
        jar,
        Json(RefreshResponse {
            access_token: refreshed.access_token,
        }),
    ))
}

fn refresh_failed() -> ApiError {
    api_error(
        StatusCode::UNAUTHORIZED,
        "Refresh failed, please log in again",
        "REFRESH_FAILED",
    )
}

/// Claims of the authenticated caller
#[utoipa::path(
    get,
    path = "/api/auth/session",
    responses(
        (status = 200, description = "Current session", body = SessionResponse),
        (status = 401, description = "Missing or invalid access token", body = ErrorResponse),
        (status = 410, description = "Access token expired; refresh and retry", body = ErrorResponse)
    ),
    tag = "auth"
)]
pub async fn current_session(Extension(session): Extension<Session>) -> Json<SessionResponse> {
    Json(SessionResponse {
        id: session.id,
        email: session.email,
    })
}

/// Health check
#[utoipa::path(
    get,
    path = "/api/health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse)
    ),
    tag = "system"
)]
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
