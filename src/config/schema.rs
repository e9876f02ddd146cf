//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the edge
//! middleware stack. All types derive Serde traits for deserialization from
//! config files.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::requesturi::SCHEME_HTTP;
use crate::security::auth::AuthScheme;
use crate::security::cors::CorsEndpoint;
use crate::security::headers::{CspPolicyDirective, HstsDirective, SecurityHeaders, XFrameOptions};

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct EdgeConfig {
    /// Listener configuration (bind address, scheme).
    pub listener: ListenerConfig,

    /// Reverse proxy header handling and path rewrites.
    pub forwarding: ForwardingConfig,

    /// Authorization extraction.
    pub auth: AuthConfig,

    /// Cross-origin resource sharing.
    pub cors: CorsConfig,

    /// Security response headers.
    pub security: SecurityConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Scheme clients use to reach the listener ("http" or "https").
    /// Set to "https" when TLS terminates in front of this process.
    pub default_scheme: String,

    /// Total request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl ListenerConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            default_scheme: SCHEME_HTTP.to_string(),
            request_timeout_secs: 30,
        }
    }
}

/// Which proxy headers to trust, and path rewrites.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ForwardingConfig {
    /// Apply the `Forwarded` header (RFC 7239).
    pub trust_forwarded: bool,

    /// Apply `X-Forwarded-Host` and `X-Forwarded-Proto`.
    pub trust_x_forwarded: bool,

    /// Path rewrites, first match wins.
    pub rewrites: Vec<RewriteRule>,
}

/// A single path rewrite.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct RewriteRule {
    /// Glob pattern (`*`, `?`, `**`).
    pub pattern: String,

    /// Replacement path.
    pub target: String,
}

/// Authorization configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Accepted schemes. Empty disables extraction.
    pub schemes: Vec<AuthScheme>,

    /// Reject requests without credentials.
    pub require: bool,

    /// Realm announced in `WWW-Authenticate`.
    pub realm: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            schemes: Vec::new(),
            require: false,
            realm: "edge-headers".to_string(),
        }
    }
}

/// CORS configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct CorsConfig {
    pub enabled: bool,

    /// Endpoints, matched by path prefix in order. Empty shares everything.
    pub endpoints: Vec<CorsEndpoint>,
}

/// Security header configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Content-Security-Policy directives. An empty list sends
    /// `default-src 'self'`; absent sends nothing.
    pub content_security_policy: Option<Vec<CspPolicyDirective>>,

    /// Send Strict-Transport-Security.
    pub hsts: bool,

    pub hsts_max_age_secs: u64,

    pub hsts_include_subdomains: bool,

    pub hsts_preload: bool,

    /// Send `X-Content-Type-Options: nosniff`.
    pub nosniff: bool,

    pub frame_options: Option<XFrameOptions>,
}

impl SecurityConfig {
    /// Translate into the header builder used by the middleware.
    pub fn to_headers(&self) -> SecurityHeaders {
        let mut headers = SecurityHeaders::new();

        if let Some(directives) = &self.content_security_policy {
            headers = headers.content_security_policy(directives.iter().cloned());
        }

        if self.hsts {
            let mut directives = vec![HstsDirective::MaxAge(Duration::from_secs(self.hsts_max_age_secs))];
            if self.hsts_include_subdomains {
                directives.push(HstsDirective::IncludeSubDomains);
            }
            if self.hsts_preload {
                directives.push(HstsDirective::Preload);
            }
            headers = headers.strict_transport_security(directives);
        }

        if self.nosniff {
            headers = headers.x_content_type_options();
        }

        if let Some(option) = self.frame_options {
            headers = headers.x_frame_options(option);
        }

        headers
    }
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            content_security_policy: None,
            hsts: false,
            hsts_max_age_secs: 31_536_000, // one year
            hsts_include_subdomains: false,
            hsts_preload: false,
            nosniff: true,
            frame_options: None,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log filter directive (e.g. "info", "edge_headers=debug").
    /// `RUST_LOG` takes precedence.
    pub log_level: String,

    /// Emit logs as JSON lines instead of human readable text.
    pub json: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json: false,
        }
    }
}
