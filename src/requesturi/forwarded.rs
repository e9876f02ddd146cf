//! Rewriters for reverse proxy headers.
//!
//! # Responsibilities
//! - `Forwarded` (RFC 7239): `host` and `proto` parameters
//! - `X-Forwarded-Host` / `X-Forwarded-Proto` (de-facto standard)
//!
//! # Design Decisions
//! - Enable only behind proxies that overwrite these headers; clients can
//!   send them too
//! - `for` and `by` are left to access logging

use axum::http::{header, HeaderMap, HeaderName};
use tracing::warn;

use crate::header::parse_value_list;
use crate::requesturi::{is_supported_scheme, RequestUrl, UrlRewriter};

/// The `X-Forwarded-Host` request header.
pub const X_FORWARDED_HOST: HeaderName = HeaderName::from_static("x-forwarded-host");

/// The `X-Forwarded-Proto` request header.
pub const X_FORWARDED_PROTO: HeaderName = HeaderName::from_static("x-forwarded-proto");

/// Applies the `Forwarded` header.
///
/// Multiple header instances are applied in order, as are the elements
/// within each; the last `host` and `proto` seen win.
#[derive(Debug, Clone, Copy, Default)]
pub struct Forwarded;

impl UrlRewriter for Forwarded {
    fn rewrite(&self, url: &mut RequestUrl, headers: &HeaderMap) {
        for value in headers.get_all(header::FORWARDED) {
            match value.to_str() {
                Ok(v) => apply_forwarded(v, url),
                Err(_) => warn!("Ignoring Forwarded header with non-ASCII content"),
            }
        }
    }
}

/// Parse a single `Forwarded` header value and apply it to `url`.
///
/// Keys are matched case-insensitively. An invalid header is ignored as a
/// whole.
pub fn apply_forwarded(header: &str, url: &mut RequestUrl) {
    if header.trim().is_empty() {
        return;
    }

    let list = match parse_value_list(header) {
        Ok(list) => list,
        Err(e) => {
            warn!(header = %header, error = %e, "Ignoring invalid Forwarded header");
            return;
        }
    };

    for value in &list {
        for (key, v) in &value.pairs {
            if key.eq_ignore_ascii_case("host") {
                url.host = v.clone();
            } else if key.eq_ignore_ascii_case("proto") {
                let proto = v.to_ascii_lowercase();
                if is_supported_scheme(&proto) {
                    url.scheme = proto;
                }
            }
        }
    }
}

/// Applies `X-Forwarded-Host` and `X-Forwarded-Proto`.
#[derive(Debug, Clone, Copy, Default)]
pub struct XForwarded;

impl UrlRewriter for XForwarded {
    fn rewrite(&self, url: &mut RequestUrl, headers: &HeaderMap) {
        for host in headers.get_all(X_FORWARDED_HOST) {
            if let Ok(h) = host.to_str() {
                if !h.is_empty() {
                    url.host = h.to_owned();
                }
            }
        }

        for proto in headers.get_all(X_FORWARDED_PROTO) {
            if let Ok(p) = proto.to_str() {
                if is_supported_scheme(p) {
                    url.scheme = p.to_owned();
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn url(scheme: &str, host: &str) -> RequestUrl {
        RequestUrl {
            scheme: scheme.to_string(),
            host: host.to_string(),
            path: "/foo/bar".to_string(),
            query: None,
        }
    }

    fn forwarded(values: &[&str]) -> HeaderMap {
        let mut headers = HeaderMap::new();
        for v in values {
            headers.append(header::FORWARDED, HeaderValue::from_str(v).unwrap());
        }
        headers
    }

    #[test]
    fn test_forwarded_no_header() {
        let mut u = url("http", "no.header");
        Forwarded.rewrite(&mut u, &HeaderMap::new());
        assert_eq!(u.to_string(), "http://no.header/foo/bar");
    }

    #[test]
    fn test_forwarded_empty_header() {
        let mut u = url("http", "empty.header");
        Forwarded.rewrite(&mut u, &forwarded(&[""]));
        assert_eq!(u.to_string(), "http://empty.header/foo/bar");
    }

    #[test]
    fn test_forwarded_proto_and_host() {
        let mut u = url("http", "forwarded.header");
        Forwarded.rewrite(&mut u, &forwarded(&["proto=https;host=localhost;for=1.2.3.4,for=9.8.7.6"]));
        assert_eq!(u.to_string(), "https://localhost/foo/bar");

        let mut u = url("https", "forwarded.header");
        Forwarded.rewrite(&mut u, &forwarded(&["proto=http;host=localhost;for=1.2.3.4,for=9.8.7.6"]));
        assert_eq!(u.to_string(), "http://localhost/foo/bar");
    }

    #[test]
    fn test_forwarded_multiple_headers() {
        let mut u = url("http", "multiple.forwarded.header");
        Forwarded.rewrite(
            &mut u,
            &forwarded(&["proto=https", "host=localhost", "for=1.2.3.4, for=9.8.7.6"]),
        );
        assert_eq!(u.to_string(), "https://localhost/foo/bar");
    }

    #[test]
    fn test_forwarded_keys_ignore_case() {
        let mut u = url("http", "a");
        Forwarded.rewrite(&mut u, &forwarded(&["Proto=HTTPS; HOST=\"b:8443\""]));
        assert_eq!(u.to_string(), "https://b:8443/foo/bar");
    }

    #[test]
    fn test_forwarded_invalid_header_is_ignored() {
        let mut u = url("http", "invalid.header");
        Forwarded.rewrite(&mut u, &forwarded(&["proto=https,host=localhost,foo=====99="]));
        assert_eq!(u.to_string(), "http://invalid.header/foo/bar");
    }

    #[test]
    fn test_forwarded_unknown_proto_is_ignored() {
        let mut u = url("http", "a");
        Forwarded.rewrite(&mut u, &forwarded(&["proto=ftp"]));
        assert_eq!(u.scheme, "http");
    }

    #[test]
    fn test_x_forwarded() {
        let mut u = url("http", "no.header");
        XForwarded.rewrite(&mut u, &HeaderMap::new());
        assert_eq!(u.to_string(), "http://no.header/foo/bar");

        let mut headers = HeaderMap::new();
        headers.insert(X_FORWARDED_HOST, HeaderValue::from_static(""));
        let mut u = url("http", "empty.header");
        XForwarded.rewrite(&mut u, &headers);
        assert_eq!(u.to_string(), "http://empty.header/foo/bar");

        let mut headers = HeaderMap::new();
        headers.insert(X_FORWARDED_HOST, HeaderValue::from_static("localhost"));
        let mut u = url("http", "forwarded-host.header");
        XForwarded.rewrite(&mut u, &headers);
        assert_eq!(u.to_string(), "http://localhost/foo/bar");

        let mut headers = HeaderMap::new();
        headers.insert(X_FORWARDED_PROTO, HeaderValue::from_static("http"));
        let mut u = url("https", "forwarded-proto.header");
        XForwarded.rewrite(&mut u, &headers);
        assert_eq!(u.to_string(), "http://forwarded-proto.header/foo/bar");
    }
}
