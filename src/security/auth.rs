//! Authorization header extraction (RFC 7235).
//!
//! # Responsibilities
//! - Parse `Basic` (RFC 7617) and `Bearer` (RFC 6750 §2.1) credentials
//! - Attach the result to the request extensions
//! - Reject unauthorized requests with a `WWW-Authenticate` challenge
//!
//! # Design Decisions
//! - Extraction never rejects; malformed credentials are treated as absent
//! - Verifying credentials is the handler's job

use std::fmt::Write as _;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{
        header::{self, InvalidHeaderValue},
        HeaderValue, Request, StatusCode,
    },
    middleware::Next,
    response::{IntoResponse, Response},
};
use base64ct::{Base64, Encoding};
use serde::{Deserialize, Serialize};

/// Credentials given as `user:password` (RFC 7617).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsernamePassword {
    pub username: String,
    pub password: String,
}

/// An opaque bearer token (RFC 6750).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BearerToken {
    pub token: String,
}

/// Credentials found in the `Authorization` request header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Authorization {
    Basic(UsernamePassword),
    Bearer(BearerToken),
}

impl Authorization {
    pub fn scheme(&self) -> AuthScheme {
        match self {
            Authorization::Basic(_) => AuthScheme::Basic,
            Authorization::Bearer(_) => AuthScheme::Bearer,
        }
    }
}

/// Supported authorization schemes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthScheme {
    Basic,
    Bearer,
}

impl AuthScheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthScheme::Basic => "Basic",
            AuthScheme::Bearer => "Bearer",
        }
    }

    fn parse_credentials(self, credentials: &str) -> Option<Authorization> {
        match self {
            AuthScheme::Basic => parse_basic(credentials).map(Authorization::Basic),
            AuthScheme::Bearer if !credentials.is_empty() => {
                Some(Authorization::Bearer(BearerToken {
                    token: credentials.to_owned(),
                }))
            }
            AuthScheme::Bearer => None,
        }
    }
}

/// Parse an `Authorization` header value using `scheme`.
///
/// The scheme name is case-insensitive and must be followed by whitespace.
/// Returns `None` for another scheme or malformed credentials.
pub fn parse_authorization(header: &str, scheme: AuthScheme) -> Option<Authorization> {
    let (name, credentials) = header.split_once([' ', '\t'])?;
    if !name.eq_ignore_ascii_case(scheme.as_str()) {
        return None;
    }
    scheme.parse_credentials(credentials.trim())
}

fn parse_basic(credentials: &str) -> Option<UsernamePassword> {
    let decoded = Base64::decode_vec(credentials).ok()?;
    let pair = String::from_utf8(decoded).ok()?;

    let mut parts = pair.split(':');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(username), Some(password), None) => Some(UsernamePassword {
            username: username.to_owned(),
            password: password.to_owned(),
        }),
        _ => None,
    }
}

/// Schemes accepted by [`authorization_middleware`].
#[derive(Debug, Clone)]
pub struct AuthState {
    schemes: Vec<AuthScheme>,
}

impl AuthState {
    pub fn new(schemes: impl IntoIterator<Item = AuthScheme>) -> Self {
        Self {
            schemes: schemes.into_iter().collect(),
        }
    }

    /// Extract credentials from all `Authorization` headers; the last
    /// acceptable one wins.
    pub fn extract<B>(&self, request: &Request<B>) -> Option<Authorization> {
        request
            .headers()
            .get_all(header::AUTHORIZATION)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .filter_map(|h| {
                self.schemes
                    .iter()
                    .find_map(|scheme| parse_authorization(h, *scheme))
            })
            .last()
    }
}

/// Attaches an [`Authorization`] extension when the request carries
/// acceptable credentials. Requests are never rejected here.
pub async fn authorization_middleware(
    State(state): State<Arc<AuthState>>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    if let Some(auth) = state.extract(&request) {
        tracing::debug!(scheme = auth.scheme().as_str(), "Request carries authorization");
        request.extensions_mut().insert(auth);
    }
    next.run(request).await
}

/// One challenge of a `WWW-Authenticate` response header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticationChallenge {
    pub scheme: AuthScheme,
    pub realm: String,
    pub params: Vec<(String, String)>,
}

impl AuthenticationChallenge {
    pub fn new(scheme: AuthScheme, realm: impl Into<String>) -> Self {
        Self {
            scheme,
            realm: realm.into(),
            params: Vec::new(),
        }
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((key.into(), value.into()));
        self
    }

    fn write_to(&self, out: &mut String) {
        let _ = write!(out, "{} realm=\"{}\"", self.scheme.as_str(), escape_quoted(&self.realm));
        for (key, value) in &self.params {
            let _ = write!(out, ", {}=\"{}\"", key, escape_quoted(value));
        }
    }
}

fn escape_quoted(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Pre-rendered `WWW-Authenticate` value for [`require_authorization_middleware`].
#[derive(Debug, Clone)]
pub struct ChallengeState {
    www_authenticate: HeaderValue,
}

impl ChallengeState {
    pub fn new(
        challenge: AuthenticationChallenge,
        more: impl IntoIterator<Item = AuthenticationChallenge>,
    ) -> Result<Self, InvalidHeaderValue> {
        let mut value = String::new();
        challenge.write_to(&mut value);
        for c in more {
            value.push_str(", ");
            c.write_to(&mut value);
        }

        Ok(Self {
            www_authenticate: HeaderValue::from_str(&value)?,
        })
    }

    pub fn www_authenticate(&self) -> &HeaderValue {
        &self.www_authenticate
    }
}

/// Rejects requests without an [`Authorization`] extension with `401`.
///
/// Must run after [`authorization_middleware`].
pub async fn require_authorization_middleware(
    State(state): State<Arc<ChallengeState>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if request.extensions().get::<Authorization>().is_none() {
        tracing::debug!(path = %request.uri().path(), "Rejecting unauthorized request");
        return (
            StatusCode::UNAUTHORIZED,
            [(header::WWW_AUTHENTICATE, state.www_authenticate.clone())],
        )
            .into_response();
    }
    next.run(request).await
}
