//! Cross-origin resource sharing.
//!
//! Requests carrying an `Origin` header get `Access-Control-Allow-*`
//! response headers according to the first endpoint whose path prefix
//! matches. Cross-origin `OPTIONS` requests (pre-flight) are answered here
//! and never reach the handler.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{
        header::{self, HeaderName, InvalidHeaderValue},
        HeaderMap, HeaderValue, Method, Request, StatusCode,
    },
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

/// Matches any origin in [`CorsEndpoint::allow_origins`].
pub const WILDCARD: &str = "*";

/// Cross-origin policy for one path prefix.
///
/// Empty lists mean the header is not sent and browser defaults apply.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct CorsEndpoint {
    /// Path prefix identifying the endpoint.
    pub path: String,
    pub allow_methods: Vec<String>,
    /// Empty or `["*"]` allows every origin.
    pub allow_origins: Vec<String>,
    pub allow_headers: Vec<String>,
    pub allow_credentials: bool,
}

impl CorsEndpoint {
    pub fn allows_origin(&self, origin: &str) -> bool {
        if self.allow_origins.is_empty() {
            return true;
        }
        if self.allow_origins.len() == 1 && self.allow_origins[0] == WILDCARD {
            return true;
        }
        self.allow_origins.iter().any(|o| o == origin)
    }
}

#[derive(Debug, Clone)]
struct CompiledEndpoint {
    endpoint: CorsEndpoint,
    headers: Vec<(HeaderName, HeaderValue)>,
}

impl CompiledEndpoint {
    fn new(endpoint: CorsEndpoint) -> Result<Self, InvalidHeaderValue> {
        let mut headers = Vec::new();
        if !endpoint.allow_methods.is_empty() {
            headers.push((
                header::ACCESS_CONTROL_ALLOW_METHODS,
                HeaderValue::from_str(&endpoint.allow_methods.join(", "))?,
            ));
        }
        if !endpoint.allow_headers.is_empty() {
            headers.push((
                header::ACCESS_CONTROL_ALLOW_HEADERS,
                HeaderValue::from_str(&endpoint.allow_headers.join(", "))?,
            ));
        }
        if endpoint.allow_credentials {
            headers.push((
                header::ACCESS_CONTROL_ALLOW_CREDENTIALS,
                HeaderValue::from_static("true"),
            ));
        }
        Ok(Self { endpoint, headers })
    }
}

/// Endpoint table for [`cors_middleware`].
#[derive(Debug, Clone)]
pub struct CorsState {
    endpoints: Vec<CompiledEndpoint>,
    catch_all: CompiledEndpoint,
}

impl CorsState {
    /// With no endpoints every path is shared with every origin.
    pub fn new(endpoints: impl IntoIterator<Item = CorsEndpoint>) -> Result<Self, InvalidHeaderValue> {
        let endpoints = endpoints
            .into_iter()
            .map(CompiledEndpoint::new)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            endpoints,
            catch_all: CompiledEndpoint::new(CorsEndpoint::default())?,
        })
    }

    fn find_endpoint(&self, path: &str) -> Option<&CompiledEndpoint> {
        if self.endpoints.is_empty() {
            return Some(&self.catch_all);
        }
        self.endpoints
            .iter()
            .find(|e| path.starts_with(&e.endpoint.path))
    }

    /// Response headers granted to `origin` requesting `path`.
    pub fn allow_headers(&self, path: &str, origin: &HeaderValue) -> HeaderMap {
        let mut headers = HeaderMap::new();

        let Some(endpoint) = self.find_endpoint(path) else {
            return headers;
        };
        let allowed = origin
            .to_str()
            .map(|o| endpoint.endpoint.allows_origin(o))
            .unwrap_or(false);
        if !allowed {
            return headers;
        }

        headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, origin.clone());
        for (name, value) in &endpoint.headers {
            headers.insert(name.clone(), value.clone());
        }
        headers
    }
}

/// Adds CORS response headers and answers pre-flight requests.
pub async fn cors_middleware(
    State(state): State<Arc<CorsState>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let origin = match request.headers().get(header::ORIGIN) {
        Some(origin) if !origin.is_empty() => origin.clone(),
        _ => return next.run(request).await,
    };

    let allow = state.allow_headers(request.uri().path(), &origin);
    if allow.is_empty() {
        tracing::debug!(origin = ?origin, path = %request.uri().path(), "Cross-origin request not allowed");
    }

    if request.method() == Method::OPTIONS {
        return (StatusCode::NO_CONTENT, allow).into_response();
    }

    let mut response = next.run(request).await;
    response.headers_mut().extend(allow);
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    fn endpoint(path: &str) -> CorsEndpoint {
        CorsEndpoint {
            path: path.to_string(),
            ..CorsEndpoint::default()
        }
    }

    #[test]
    fn test_allows_origin() {
        let e = endpoint("/");
        assert!(e.allows_origin("https://a.example"));

        let e = CorsEndpoint {
            allow_origins: vec![WILDCARD.to_string()],
            ..endpoint("/")
        };
        assert!(e.allows_origin("https://a.example"));

        let e = CorsEndpoint {
            allow_origins: vec!["https://a.example".to_string()],
            ..endpoint("/")
        };
        assert!(e.allows_origin("https://a.example"));
        assert!(!e.allows_origin("https://b.example"));
    }

    #[test]
    fn test_catch_all_without_endpoints() {
        let state = CorsState::new([]).unwrap();
        let headers = state.allow_headers("/anything", &HeaderValue::from_static("https://a.example"));
        assert_eq!(headers.len(), 1);
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "https://a.example");
    }

    #[test]
    fn test_endpoint_headers() {
        let state = CorsState::new([
            CorsEndpoint {
                allow_methods: vec!["GET".to_string(), "POST".to_string()],
                allow_headers: vec!["Content-Type".to_string()],
                allow_credentials: true,
                ..endpoint("/api")
            },
            endpoint("/public"),
        ])
        .unwrap();
        let origin = HeaderValue::from_static("https://a.example");

        let headers = state.allow_headers("/api/users", &origin);
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_METHODS], "GET, POST");
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_HEADERS], "Content-Type");
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_CREDENTIALS], "true");

        let headers = state.allow_headers("/public/img.png", &origin);
        assert_eq!(headers.len(), 1);

        assert!(state.allow_headers("/private", &origin).is_empty());
    }
}
