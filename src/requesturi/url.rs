//! Absolute request URL and the middleware that builds it.

use std::fmt;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{header, Request, Uri},
    middleware::Next,
    response::Response,
};

use crate::requesturi::{UrlRewriter, SCHEME_HTTP};

/// The URL a client used to reach us, as far as we can tell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestUrl {
    pub scheme: String,
    /// Host and optional port.
    pub host: String,
    pub path: String,
    pub query: Option<String>,
}

impl RequestUrl {
    /// Build the URL seen on the wire, before any rewriting.
    ///
    /// The host comes from the `Host` header, falling back to the request
    /// target's authority (absolute-form requests, HTTP/2).
    pub fn from_request<B>(request: &Request<B>, default_scheme: &str) -> Self {
        let uri = request.uri();
        let host = request
            .headers()
            .get(header::HOST)
            .and_then(|h| h.to_str().ok())
            .map(str::to_owned)
            .or_else(|| uri.authority().map(|a| a.to_string()))
            .unwrap_or_default();

        Self {
            scheme: default_scheme.to_owned(),
            host,
            path: uri.path().to_owned(),
            query: uri.query().map(str::to_owned),
        }
    }

    /// Convert to an absolute-form URI.
    pub fn to_uri(&self) -> Result<Uri, axum::http::Error> {
        let path_and_query = match &self.query {
            Some(query) => format!("{}?{}", self.path, query),
            None => self.path.clone(),
        };

        Uri::builder()
            .scheme(self.scheme.as_str())
            .authority(self.host.as_str())
            .path_and_query(path_and_query)
            .build()
    }
}

impl Default for RequestUrl {
    fn default() -> Self {
        Self {
            scheme: SCHEME_HTTP.to_owned(),
            host: String::new(),
            path: "/".to_owned(),
            query: None,
        }
    }
}

impl fmt::Display for RequestUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}{}", self.scheme, self.host, self.path)?;
        if let Some(query) = &self.query {
            write!(f, "?{}", query)?;
        }
        Ok(())
    }
}

/// State for the request URL middleware.
#[derive(Debug)]
pub struct RequestUrlState {
    default_scheme: String,
    rewriters: Vec<Box<dyn UrlRewriter>>,
}

impl RequestUrlState {
    pub fn new(default_scheme: impl Into<String>) -> Self {
        Self {
            default_scheme: default_scheme.into(),
            rewriters: Vec::new(),
        }
    }

    /// Append a rewriter. Rewriters run in the order they were added.
    pub fn with_rewriter(mut self, rewriter: impl UrlRewriter + 'static) -> Self {
        self.rewriters.push(Box::new(rewriter));
        self
    }

    /// Compute the rewritten URL for a request without touching it.
    pub fn resolve<B>(&self, request: &Request<B>) -> RequestUrl {
        let mut url = RequestUrl::from_request(request, &self.default_scheme);
        for rewriter in &self.rewriters {
            rewriter.rewrite(&mut url, request.headers());
        }
        url
    }
}

/// Completes the request URI with scheme and host.
///
/// After the configured rewriters ran, the request URI is replaced by its
/// absolute form and the [`RequestUrl`] is attached to the request
/// extensions. If the result is not a valid URI (e.g. no host is known),
/// the original URI is kept.
pub async fn request_url_middleware(
    State(state): State<Arc<RequestUrlState>>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let url = state.resolve(&request);

    match url.to_uri() {
        Ok(uri) => *request.uri_mut() = uri,
        Err(e) => {
            tracing::debug!(url = %url, error = %e, "Keeping original request URI");
        }
    }

    request.extensions_mut().insert(url);
    next.run(request).await
}
