//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the inspection handler
//! - Translate EdgeConfig into middleware state
//! - Wire up middleware (tracing, timeout, security, CORS, URL, auth)
//! - Bind server to listener with graceful shutdown

use std::future::Future;
use std::sync::Arc;

use axum::{
    extract::Extension,
    http::{header::InvalidHeaderValue, Method, Uri},
    middleware::from_fn_with_state,
    routing::any,
    Json, Router,
};
use serde_json::json;
use thiserror::Error;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::EdgeConfig;
use crate::requesturi::{
    request_url_middleware, Forwarded, RequestUrl, RequestUrlState, RewriteError, RewritePath,
    XForwarded,
};
use crate::security::{
    authorization_middleware, cors_middleware, require_authorization_middleware,
    security_headers_middleware, AuthState, AuthenticationChallenge, Authorization,
    ChallengeState, CorsState,
};

/// Error building the server from a configuration.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("invalid path rewrite: {0}")]
    Rewrite(#[from] RewriteError),

    #[error("configured header value is invalid: {0}")]
    HeaderValue(#[from] InvalidHeaderValue),
}

/// HTTP server exposing the edge middleware stack.
pub struct EdgeServer {
    router: Router,
    config: EdgeConfig,
}

impl EdgeServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: EdgeConfig) -> Result<Self, ServerError> {
        let router = Self::build_router(&config)?;
        Ok(Self { router, config })
    }

    /// Build the Axum router with all middleware layers.
    ///
    /// Layers added later wrap the earlier ones, so a request passes
    /// trace → timeout → security headers → CORS → URL → auth → handler.
    #[allow(deprecated)]
    fn build_router(config: &EdgeConfig) -> Result<Router, ServerError> {
        let mut router = Router::new()
            .route("/", any(inspect_handler))
            .route("/{*path}", any(inspect_handler));

        let auth = &config.auth;
        if auth.require {
            let mut challenges = auth
                .schemes
                .iter()
                .map(|scheme| AuthenticationChallenge::new(*scheme, auth.realm.clone()));
            match challenges.next() {
                Some(first) => {
                    let state = ChallengeState::new(first, challenges)?;
                    router = router.layer(from_fn_with_state(Arc::new(state), require_authorization_middleware));
                }
                None => tracing::warn!("auth.require is set without schemes; not enforcing"),
            }
        }
        if !auth.schemes.is_empty() {
            let state = AuthState::new(auth.schemes.iter().copied());
            router = router.layer(from_fn_with_state(Arc::new(state), authorization_middleware));
        }

        router = router.layer(from_fn_with_state(
            Arc::new(Self::url_state(config)?),
            request_url_middleware,
        ));

        if config.cors.enabled {
            let state = CorsState::new(config.cors.endpoints.iter().cloned())?;
            router = router.layer(from_fn_with_state(Arc::new(state), cors_middleware));
        }

        let headers = config.security.to_headers();
        if !headers.is_empty() {
            let state = headers.build()?;
            router = router.layer(from_fn_with_state(Arc::new(state), security_headers_middleware));
        }

        Ok(router.layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(TimeoutLayer::new(config.listener.request_timeout())),
        ))
    }

    fn url_state(config: &EdgeConfig) -> Result<RequestUrlState, ServerError> {
        let forwarding = &config.forwarding;
        let mut state = RequestUrlState::new(config.listener.default_scheme.clone());

        if forwarding.trust_x_forwarded {
            state = state.with_rewriter(XForwarded);
        }
        if forwarding.trust_forwarded {
            state = state.with_rewriter(Forwarded);
        }
        if !forwarding.rewrites.is_empty() {
            let rules = forwarding
                .rewrites
                .iter()
                .map(|r| (r.pattern.as_str(), r.target.clone()));
            state = state.with_rewriter(RewritePath::new(rules)?);
        }

        Ok(state)
    }

    /// The configured router, e.g. for driving it without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &EdgeConfig {
        &self.config
    }

    /// Run the server until Ctrl+C.
    pub async fn run(self, listener: TcpListener) -> Result<(), std::io::Error> {
        self.run_until(listener, shutdown_signal()).await
    }

    /// Run the server until `shutdown` completes.
    pub async fn run_until<F>(self, listener: TcpListener, shutdown: F) -> Result<(), std::io::Error>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown)
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Echo what the middleware stack made of the request.
async fn inspect_handler(
    method: Method,
    uri: Uri,
    url: Option<Extension<RequestUrl>>,
    auth: Option<Extension<Authorization>>,
) -> Json<serde_json::Value> {
    let authorization = auth.map(|Extension(auth)| match auth {
        Authorization::Basic(basic) => json!({ "scheme": "basic", "username": basic.username }),
        Authorization::Bearer(_) => json!({ "scheme": "bearer" }),
    });

    Json(json!({
        "method": method.as_str(),
        "uri": uri.to_string(),
        "url": url.map(|Extension(url)| url.to_string()),
        "authorization": authorization,
    }))
}

/// Wait for shutdown signal (Ctrl+C).
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
