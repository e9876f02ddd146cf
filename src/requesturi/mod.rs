//! Request URL reconstruction.
//!
//! # Data Flow
//! ```text
//! Incoming request (origin-form URI, Host header)
//!     → url.rs (default scheme + Host → RequestUrl)
//!     → forwarded.rs (Forwarded / X-Forwarded-* from trusted proxies)
//!     → rewrite.rs (glob path rewrites)
//!     → absolute request URI + RequestUrl extension
//!     → Pass to handler
//! ```
//!
//! # Design Decisions
//! - Rewriters run in configuration order; later ones win
//! - Malformed proxy headers are logged and ignored, never partially applied
//! - Only `http` and `https` are accepted as schemes

pub mod forwarded;
pub mod rewrite;
pub mod url;

use axum::http::HeaderMap;

pub use forwarded::{Forwarded, XForwarded};
pub use rewrite::{PathPattern, RewriteError, RewritePath};
pub use url::{request_url_middleware, RequestUrl, RequestUrlState};

/// URL scheme for plain HTTP.
pub const SCHEME_HTTP: &str = "http";

/// URL scheme for HTTP over TLS.
pub const SCHEME_HTTPS: &str = "https";

/// Returns true for the schemes a rewriter may switch to.
pub fn is_supported_scheme(scheme: &str) -> bool {
    scheme == SCHEME_HTTP || scheme == SCHEME_HTTPS
}

/// Updates a request URL from other parts of the request.
pub trait UrlRewriter: Send + Sync + std::fmt::Debug {
    fn rewrite(&self, url: &mut RequestUrl, headers: &HeaderMap);
}
