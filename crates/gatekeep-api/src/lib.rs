//! HTTP transport for gatekeep
//!
//! Public routes issue, refresh and clear token cookies; protected routes sit
//! behind [`middleware::require_access`].

pub mod cookies;
pub mod handlers;
pub mod middleware;
pub mod models;

use axum::{
    http::{header, HeaderValue, Method},
    middleware as axum_middleware,
    routing::{get, post},
    Json, Router,
};
use gatekeep_auth::{AccessGate, CredentialIssuer, IdentityStore, RefreshExchanger, TokenKeys};
use std::{net::SocketAddr, sync::Arc};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use utoipa::OpenApi;

pub use cookies::CookieConfig;

/// Application state shared across handlers
pub struct AppState {
    pub issuer: CredentialIssuer,
    pub gate: AccessGate,
    pub exchanger: RefreshExchanger,
    pub cookies: CookieConfig,
}

impl AppState {
    pub fn new(
        store: Arc<dyn IdentityStore>,
        keys: Arc<TokenKeys>,
        cookies: CookieConfig,
    ) -> Self {
        Self {
            issuer: CredentialIssuer::new(store, keys.clone()),
            gate: AccessGate::new(keys.clone()),
            exchanger: RefreshExchanger::new(keys),
            cookies,
        }
    }
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "gatekeep API",
        version = "0.1.0",
        description = "Stateless access/refresh token authentication"
    ),
    paths(
        handlers::login,
        handlers::logout,
        handlers::refresh,
        handlers::current_session,
        handlers::health_check,
    ),
    components(
        schemas(
            models::LoginRequest,
            models::LoginResponse,
            models::RefreshRequest,
            models::RefreshResponse,
            models::SessionResponse,
            models::MessageResponse,
            models::HealthResponse,
            models::ErrorResponse,
        )
    ),
    tags(
        (name = "auth", description = "Login, logout, refresh and session endpoints"),
        (name = "system", description = "System health and info endpoints")
    )
)]
pub struct ApiDoc;

/// API server configuration
pub struct ApiServerConfig {
    /// Address to bind the API server
    pub bind_addr: SocketAddr,
    /// Enable CORS (for development)
    pub enable_cors: bool,
}

impl Default for ApiServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
            enable_cors: true,
        }
    }
}

/// API Server
pub struct ApiServer {
    config: ApiServerConfig,
    state: Arc<AppState>,
}

impl ApiServer {
    pub fn new(config: ApiServerConfig, state: AppState) -> Self {
        Self {
            config,
            state: Arc::new(state),
        }
    }

    /// Build the router with all routes
    pub fn build_router(&self) -> Router {
        // Build PUBLIC routes (no authentication required)
        let public_router = Router::new()
            .route("/api/health", get(handlers::health_check))
            .route("/api/openapi.json", get(openapi_json))
            .route("/api/auth/login", post(handlers::login))
            .route(
                "/api/auth/logout",
                post(handlers::logout).delete(handlers::logout),
            )
            .route(
                "/api/auth/refresh",
                post(handlers::refresh).put(handlers::refresh),
            )
            .with_state(self.state.clone());

        // Build PROTECTED routes (require a valid access token)
        let protected_router = Router::new()
            .route("/api/auth/session", get(handlers::current_session))
            .with_state(self.state.clone())
            .layer(axum_middleware::from_fn_with_state(
                self.state.clone(),
                middleware::require_access,
            ));

        let mut router = public_router
            .merge(protected_router)
            .layer(TraceLayer::new_for_http());

        if self.config.enable_cors {
            router = router.layer(cors_layer());
        }

        router
    }

    /// Start the API server
    pub async fn start(self) -> Result<(), anyhow::Error> {
        let router = self.build_router();

        info!("Starting API server on {}", self.config.bind_addr);
        info!(
            "OpenAPI spec: http://{}/api/openapi.json",
            self.config.bind_addr
        );

        let listener = tokio::net::TcpListener::bind(self.config.bind_addr).await?;

        axum::serve(listener, router)
            .await
            .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;

        Ok(())
    }
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

/// Cookie auth needs credentials, which rules out a wildcard origin
fn cors_layer() -> CorsLayer {
    use tower_http::cors::AllowOrigin;

    CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::COOKIE])
        .allow_credentials(true)
        .allow_origin(AllowOrigin::predicate(|origin: &HeaderValue, _| {
            let origin_str = origin.to_str().unwrap_or("");
            origin_str.starts_with("http://localhost:")
                || origin_str.starts_with("http://127.0.0.1:")
                || origin_str.starts_with("https://localhost:")
                || origin_str.starts_with("https://127.0.0.1:")
        }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_generation() {
        let doc = ApiDoc::openapi();
        let json = serde_json::to_string(&doc).unwrap();
        assert!(json.contains("/api/auth/refresh"));
        assert!(json.contains("/api/auth/session"));
    }
}
