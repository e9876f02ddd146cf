//! Security response headers.
//!
//! # Responsibilities
//! - Content-Security-Policy
//! - Strict-Transport-Security
//! - X-Content-Type-Options
//! - X-Frame-Options
//!
//! # Design Decisions
//! - Headers set by the handler take precedence
//! - Header values are rendered once, when the middleware state is built

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::State,
    http::{
        header::{self, HeaderName, InvalidHeaderValue},
        HeaderValue, Request,
    },
    middleware::Next,
    response::Response,
};
use serde::{Deserialize, Serialize};

pub const CSP_NONE: &str = "'none'";
pub const CSP_SELF: &str = "'self'";
pub const CSP_UNSAFE_INLINE: &str = "'unsafe-inline'";
pub const CSP_UNSAFE_EVAL: &str = "'unsafe-eval'";
pub const CSP_WASM_UNSAFE_EVAL: &str = "'wasm-unsafe-eval'";
pub const CSP_STRICT_DYNAMIC: &str = "'strict-dynamic'";

/// CSP fetch directives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CspFetchDirective {
    ChildSrc,
    ConnectSrc,
    DefaultSrc,
    FencedFrameSrc,
    FontSrc,
    FrameSrc,
    ImgSrc,
    ManifestSrc,
    MediaSrc,
    ObjectSrc,
    ScriptSrc,
    ScriptSrcElem,
    ScriptSrcAttr,
    StyleSrc,
    StyleSrcElem,
    StyleSrcAttr,
    WorkerSrc,
}

impl CspFetchDirective {
    pub fn as_str(&self) -> &'static str {
        match self {
            CspFetchDirective::ChildSrc => "child-src",
            CspFetchDirective::ConnectSrc => "connect-src",
            CspFetchDirective::DefaultSrc => "default-src",
            CspFetchDirective::FencedFrameSrc => "fenced-frame-src",
            CspFetchDirective::FontSrc => "font-src",
            CspFetchDirective::FrameSrc => "frame-src",
            CspFetchDirective::ImgSrc => "img-src",
            CspFetchDirective::ManifestSrc => "manifest-src",
            CspFetchDirective::MediaSrc => "media-src",
            CspFetchDirective::ObjectSrc => "object-src",
            CspFetchDirective::ScriptSrc => "script-src",
            CspFetchDirective::ScriptSrcElem => "script-src-elem",
            CspFetchDirective::ScriptSrcAttr => "script-src-attr",
            CspFetchDirective::StyleSrc => "style-src",
            CspFetchDirective::StyleSrcElem => "style-src-elem",
            CspFetchDirective::StyleSrcAttr => "style-src-attr",
            CspFetchDirective::WorkerSrc => "worker-src",
        }
    }
}

/// One policy directive: a fetch directive and its allowed sources.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct CspPolicyDirective {
    pub directive: CspFetchDirective,
    pub sources: Vec<String>,
}

impl CspPolicyDirective {
    pub fn new<I, S>(directive: CspFetchDirective, sources: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            directive,
            sources: sources.into_iter().map(Into::into).collect(),
        }
    }
}

impl fmt::Display for CspPolicyDirective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.directive.as_str())?;
        for source in &self.sources {
            write!(f, " {}", source)?;
        }
        Ok(())
    }
}

/// Strict-Transport-Security directives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HstsDirective {
    MaxAge(Duration),
    IncludeSubDomains,
    Preload,
}

impl fmt::Display for HstsDirective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HstsDirective::MaxAge(d) => write!(f, "max-age={}", d.as_secs()),
            HstsDirective::IncludeSubDomains => f.write_str("includeSubDomains"),
            HstsDirective::Preload => f.write_str("preload"),
        }
    }
}

/// One year, the HSTS preload minimum.
pub const HSTS_DEFAULT_MAX_AGE: Duration = Duration::from_secs(31_536_000);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub enum XFrameOptions {
    #[serde(rename = "DENY")]
    Deny,
    #[serde(rename = "SAMEORIGIN")]
    SameOrigin,
}

impl XFrameOptions {
    pub fn as_str(&self) -> &'static str {
        match self {
            XFrameOptions::Deny => "DENY",
            XFrameOptions::SameOrigin => "SAMEORIGIN",
        }
    }
}

fn join<T: fmt::Display>(items: &[T]) -> String {
    items
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Builder for the set of security headers to inject.
///
/// Setting the same header twice keeps the last value.
#[derive(Debug, Clone, Default)]
pub struct SecurityHeaders {
    headers: Vec<(HeaderName, String)>,
}

impl SecurityHeaders {
    pub fn new() -> Self {
        Self::default()
    }

    fn set(mut self, name: HeaderName, value: String) -> Self {
        self.headers.retain(|(n, _)| *n != name);
        self.headers.push((name, value));
        self
    }

    /// Defaults to `default-src 'self'` when `directives` is empty.
    pub fn content_security_policy(self, directives: impl IntoIterator<Item = CspPolicyDirective>) -> Self {
        let mut directives: Vec<_> = directives.into_iter().collect();
        if directives.is_empty() {
            directives.push(CspPolicyDirective::new(CspFetchDirective::DefaultSrc, [CSP_SELF]));
        }
        self.set(header::CONTENT_SECURITY_POLICY, join(&directives))
    }

    /// Defaults to `max-age=31536000` when `directives` is empty.
    pub fn strict_transport_security(self, directives: impl IntoIterator<Item = HstsDirective>) -> Self {
        let mut directives: Vec<_> = directives.into_iter().collect();
        if directives.is_empty() {
            directives.push(HstsDirective::MaxAge(HSTS_DEFAULT_MAX_AGE));
        }
        self.set(header::STRICT_TRANSPORT_SECURITY, join(&directives))
    }

    /// `X-Content-Type-Options: nosniff`, the only defined value.
    pub fn x_content_type_options(self) -> Self {
        self.set(header::X_CONTENT_TYPE_OPTIONS, "nosniff".to_owned())
    }

    pub fn x_frame_options(self, option: XFrameOptions) -> Self {
        self.set(header::X_FRAME_OPTIONS, option.as_str().to_owned())
    }

    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }

    /// Render the header values for [`security_headers_middleware`].
    pub fn build(self) -> Result<SecurityHeadersState, InvalidHeaderValue> {
        let headers = self
            .headers
            .into_iter()
            .map(|(name, value)| Ok((name, HeaderValue::from_str(&value)?)))
            .collect::<Result<Vec<_>, InvalidHeaderValue>>()?;
        Ok(SecurityHeadersState { headers })
    }
}

/// Rendered security headers.
#[derive(Debug, Clone)]
pub struct SecurityHeadersState {
    headers: Vec<(HeaderName, HeaderValue)>,
}

impl SecurityHeadersState {
    pub fn get(&self, name: &HeaderName) -> Option<&HeaderValue> {
        self.headers.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }
}

/// Adds the configured security headers unless the handler set them.
pub async fn security_headers_middleware(
    State(state): State<Arc<SecurityHeadersState>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();
    for (name, value) in &state.headers {
        if !headers.contains_key(name) {
            headers.insert(name.clone(), value.clone());
        }
    }
    response
}
