use axum::{http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Login request
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoginRequest {
    /// Principal email address
    pub email: String,
    /// Principal password
    pub password: String,
}

/// Login response. Tokens travel as cookies, not in the body.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoginResponse {
    /// Principal ID
    pub id: String,
    /// Principal email address
    pub email: String,
}

/// Refresh request. The body field takes precedence over the `refreshToken` cookie.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
}

/// Refresh response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RefreshResponse {
    /// Newly minted access token (also set as the `accessToken` cookie)
    pub access_token: String,
}

/// Claims of the authenticated caller
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SessionResponse {
    pub id: String,
    pub email: String,
}

/// Plain acknowledgement
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// Service status
    pub status: String,
    /// Service version
    pub version: String,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
    /// Error code
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

/// Error half of every handler result
pub type ApiError = (StatusCode, Json<ErrorResponse>);

pub(crate) fn api_error(status: StatusCode, error: &str, code: &str) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: error.to_string(),
            code: Some(code.to_string()),
        }),
    )
}

pub(crate) fn internal_error() -> ApiError {
    api_error(
        StatusCode::INTERNAL_SERVER_ERROR,
        "Internal server error",
        "INTERNAL_ERROR",
    )
}

pub(crate) fn invalid_request() -> ApiError {
    api_error(
        StatusCode::BAD_REQUEST,
        "Malformed request body",
        "INVALID_REQUEST",
    )
}
