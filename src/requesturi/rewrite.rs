//! Glob based path rewriting.
//!
//! Patterns are absolute paths split on `/`. Within a segment `*` matches
//! any run of characters and `?` a single character; a segment that is
//! exactly `**` matches any number of segments, including none.

use axum::http::HeaderMap;
use thiserror::Error;

use crate::requesturi::{RequestUrl, UrlRewriter};

/// Error building a path rewriter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RewriteError {
    #[error("pattern {0:?} must start with '/'")]
    RelativePattern(String),

    #[error("pattern {0:?}: '**' must be a whole path segment")]
    MisplacedAnyDepth(String),

    #[error("rewrite target {0:?} must start with '/'")]
    RelativeTarget(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    /// `**`
    AnyDepth,
    Glob(Vec<char>),
}

/// A compiled path glob.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    source: String,
    segments: Vec<Segment>,
}

impl PathPattern {
    pub fn new(pattern: &str) -> Result<Self, RewriteError> {
        if !pattern.starts_with('/') {
            return Err(RewriteError::RelativePattern(pattern.to_owned()));
        }

        let segments = pattern
            .split('/')
            .map(|s| match s {
                "**" => Ok(Segment::AnyDepth),
                s if s.contains("**") => Err(RewriteError::MisplacedAnyDepth(pattern.to_owned())),
                s => Ok(Segment::Glob(s.chars().collect())),
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            source: pattern.to_owned(),
            segments,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn matches(&self, path: &str) -> bool {
        let path: Vec<&str> = path.split('/').collect();
        match_segments(&self.segments, &path)
    }
}

fn match_segments(pattern: &[Segment], path: &[&str]) -> bool {
    match pattern.split_first() {
        None => path.is_empty(),
        Some((Segment::AnyDepth, rest)) => {
            (0..=path.len()).any(|skip| match_segments(rest, &path[skip..]))
        }
        Some((Segment::Glob(glob), rest)) => match path.split_first() {
            Some((segment, tail)) => {
                let text: Vec<char> = segment.chars().collect();
                match_glob(glob, &text) && match_segments(rest, tail)
            }
            None => false,
        },
    }
}

/// Wildcard match of a single segment, backtracking to the last `*`.
fn match_glob(pattern: &[char], text: &[char]) -> bool {
    let (mut p, mut t) = (0, 0);
    let mut star: Option<(usize, usize)> = None;

    while t < text.len() {
        match pattern.get(p) {
            Some('*') => {
                star = Some((p, t));
                p += 1;
            }
            Some(&c) if c == '?' || c == text[t] => {
                p += 1;
                t += 1;
            }
            _ => match star {
                Some((sp, st)) => {
                    p = sp + 1;
                    t = st + 1;
                    star = Some((sp, st + 1));
                }
                None => return false,
            },
        }
    }

    pattern[p..].iter().all(|&c| c == '*')
}

/// Replaces the request path with the target of the first matching pattern.
///
/// The query string is kept.
#[derive(Debug, Clone, Default)]
pub struct RewritePath {
    rules: Vec<(PathPattern, String)>,
}

impl RewritePath {
    /// Compile `(pattern, target)` rules, checked in the given order.
    pub fn new<I, P, T>(rules: I) -> Result<Self, RewriteError>
    where
        I: IntoIterator<Item = (P, T)>,
        P: AsRef<str>,
        T: Into<String>,
    {
        let rules = rules
            .into_iter()
            .map(|(pattern, target)| {
                let target = target.into();
                if !target.starts_with('/') {
                    return Err(RewriteError::RelativeTarget(target));
                }
                Ok((PathPattern::new(pattern.as_ref())?, target))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { rules })
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl UrlRewriter for RewritePath {
    fn rewrite(&self, url: &mut RequestUrl, _headers: &HeaderMap) {
        if let Some((pattern, target)) = self.rules.iter().find(|(p, _)| p.matches(&url.path)) {
            tracing::debug!(pattern = pattern.as_str(), from = %url.path, to = %target, "Rewriting path");
            url.path = target.clone();
        }
    }
}
