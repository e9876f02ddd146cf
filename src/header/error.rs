//! Field value parse errors.

use thiserror::Error;

/// Error returned when a structured field value cannot be parsed.
///
/// Positions are byte offsets into the original input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// An opening `"` was never closed.
    #[error("unterminated quoted string at byte {position}")]
    MalformedQuotedString { position: usize },

    /// The input is structurally invalid at `position`.
    #[error("malformed header value at byte {position}: {reason}")]
    MalformedHeaderValue { position: usize, reason: Malformed },
}

/// What made a field value malformed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Malformed {
    /// Expected `,`, `;` or `=` but found something else.
    #[error("unexpected delimiter '{delimiter}' at '{remainder}'")]
    UnexpectedDelimiter { delimiter: char, remainder: String },

    /// Neither a token nor a quoted string where one is required.
    #[error("missing element")]
    MissingElement,

    /// A second unkeyed element, or one following key=value pairs.
    #[error("unexpected unkeyed element '{element}'")]
    UnexpectedPrimary { element: String },
}

impl ParseError {
    /// Byte offset in the input where parsing stopped.
    pub fn position(&self) -> usize {
        match self {
            ParseError::MalformedQuotedString { position }
            | ParseError::MalformedHeaderValue { position, .. } => *position,
        }
    }
}
