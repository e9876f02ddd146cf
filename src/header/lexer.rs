//! Lexical primitives for field values: tokens, quoted strings, whitespace.

use crate::header::error::ParseError;

/// Characters allowed in a token besides ASCII alphanumerics.
pub const TOKEN_SYMBOLS: &str = "!#$%&'*+-.^_`|~";

/// Returns true if `b` is an RFC 7230 `tchar`.
pub fn is_token_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || TOKEN_SYMBOLS.as_bytes().contains(&b)
}

/// Returns true if `s` is a non-empty token and can be written unquoted.
pub fn is_token(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(is_token_byte)
}

/// Scan the longest run of token characters at the start of `input`.
///
/// An empty result means there is no token here; it is not an error.
/// All token characters are ASCII, so the returned length in bytes is
/// always a char boundary of `input`.
pub fn scan_token(input: &str) -> &str {
    let end = input
        .bytes()
        .position(|b| !is_token_byte(b))
        .unwrap_or(input.len());
    &input[..end]
}

/// Read a quoted string at the start of `input`.
///
/// Returns `Ok(None)` if `input` does not start with `"`, so the caller can
/// try a token instead. Otherwise returns the content between the opening
/// quote and the first closing quote. Backslashes are kept as ordinary
/// characters.
pub fn read_quoted_string(input: &str) -> Result<Option<&str>, ParseError> {
    let Some(rest) = input.strip_prefix('"') else {
        return Ok(None);
    };

    match rest.find('"') {
        Some(end) => Ok(Some(&rest[..end])),
        None => Err(ParseError::MalformedQuotedString { position: 0 }),
    }
}

/// Number of leading whitespace bytes in `input`.
pub(crate) fn whitespace_len(input: &str) -> usize {
    input
        .char_indices()
        .find(|(_, c)| !c.is_whitespace())
        .map(|(i, _)| i)
        .unwrap_or(input.len())
}

/// One parsed element and the number of input bytes it consumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Element<'a> {
    pub text: &'a str,
    pub consumed: usize,
}

/// Read a quoted string or, failing that, a token.
///
/// Returns `None` when neither is present at the start of `input`. An empty
/// quoted string (`""`) is an element; an empty token is not.
pub(crate) fn read_element(input: &str) -> Result<Option<Element<'_>>, ParseError> {
    if let Some(text) = read_quoted_string(input)? {
        return Ok(Some(Element {
            text,
            consumed: text.len() + 2,
        }));
    }

    let token = scan_token(input);
    if token.is_empty() {
        Ok(None)
    } else {
        Ok(Some(Element {
            text: token,
            consumed: token.len(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_token() {
        assert_eq!(scan_token("foo"), "foo");
        assert_eq!(scan_token("foo 99"), "foo");
        assert_eq!(scan_token("   asd "), "");
        assert_eq!(scan_token("UTF-8;q=1"), "UTF-8");
        assert_eq!(scan_token("a!#$%&'*+-.^_`|~z,"), "a!#$%&'*+-.^_`|~z");
        assert_eq!(scan_token(""), "");
    }

    #[test]
    fn test_scan_token_stops_before_multibyte() {
        assert_eq!(scan_token("abcé"), "abc");
        assert_eq!(scan_token("£"), "");
    }

    #[test]
    fn test_read_quoted_string() {
        assert_eq!(read_quoted_string("foo"), Ok(None));
        assert_eq!(read_quoted_string("\"foo\" 99"), Ok(Some("foo")));
        assert_eq!(read_quoted_string("  \"asd\" "), Ok(None));
        assert_eq!(read_quoted_string("\"\""), Ok(Some("")));
        assert_eq!(read_quoted_string("\"a, b; c=d\""), Ok(Some("a, b; c=d")));
    }

    #[test]
    fn test_read_quoted_string_keeps_backslashes() {
        assert_eq!(read_quoted_string(r#""a\b""#), Ok(Some(r"a\b")));
        // first quote closes, escapes are not interpreted
        assert_eq!(read_quoted_string(r#""a\"b""#), Ok(Some(r"a\")));
    }

    #[test]
    fn test_read_quoted_string_unterminated() {
        assert_eq!(
            read_quoted_string("\"foo"),
            Err(ParseError::MalformedQuotedString { position: 0 })
        );
    }

    #[test]
    fn test_whitespace_len() {
        assert_eq!(whitespace_len("  a"), 2);
        assert_eq!(whitespace_len("\t\u{a0}b"), 3);
        assert_eq!(whitespace_len("   "), 3);
        assert_eq!(whitespace_len("x "), 0);
    }

    #[test]
    fn test_read_element() {
        let quoted = read_element("\"é\";x").unwrap().unwrap();
        assert_eq!(quoted.text, "é");
        assert_eq!(quoted.consumed, 4);

        let token = read_element("abc=1").unwrap().unwrap();
        assert_eq!(token.text, "abc");
        assert_eq!(token.consumed, 3);

        assert_eq!(read_element("=1").unwrap(), None);
    }
}
