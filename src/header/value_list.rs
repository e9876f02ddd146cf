//! Comma-separated value lists with `;`-separated parameters.
//!
//! ```text
//! value-list = value *( "," value )
//! value      = element *( ";" element )
//! element    = key "=" word / word
//! word       = token / quoted-string
//! ```
//!
//! At most one unkeyed `word` (the primary) is allowed per value, and only
//! before any pairs.

use std::collections::BTreeMap;
use std::fmt;
use std::ops::Index;
use std::str::FromStr;

use crate::header::error::{Malformed, ParseError};
use crate::header::lexer::{is_token, read_element, whitespace_len};

/// One comma-separated unit of a field value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Value {
    /// Leading unkeyed element, if the unit has one.
    pub primary: Option<String>,
    /// Parameters, keyed as written. A repeated key keeps the last value.
    pub pairs: BTreeMap<String, String>,
}

impl Value {
    /// Create a value holding only a primary element.
    pub fn with_primary(primary: impl Into<String>) -> Self {
        Self {
            primary: Some(primary.into()),
            pairs: BTreeMap::new(),
        }
    }

    /// Add a parameter, replacing any previous value for `key`.
    pub fn with_pair(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.pairs.insert(key.into(), value.into());
        self
    }

    pub fn primary(&self) -> Option<&str> {
        self.primary.as_deref()
    }

    /// Look up a parameter by its exact key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs.get(key).map(String::as_str)
    }

    /// Look up a parameter ignoring ASCII case.
    ///
    /// If several keys differ only in case, the first in key order wins.
    pub fn get_ignore_ascii_case(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        if let Some(primary) = &self.primary {
            write_word(f, primary)?;
            first = false;
        }
        for (key, value) in &self.pairs {
            if !first {
                f.write_str("; ")?;
            }
            write_word(f, key)?;
            f.write_str("=")?;
            write_word(f, value)?;
            first = false;
        }
        Ok(())
    }
}

fn write_word(f: &mut fmt::Formatter<'_>, word: &str) -> fmt::Result {
    if is_token(word) {
        f.write_str(word)
    } else {
        write!(f, "\"{}\"", word)
    }
}

/// Ordered list of values, in the order they appear in the field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValueList(Vec<Value>);

impl ValueList {
    pub fn iter(&self) -> std::slice::Iter<'_, Value> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_inner(self) -> Vec<Value> {
        self.0
    }
}

impl From<Vec<Value>> for ValueList {
    fn from(values: Vec<Value>) -> Self {
        Self(values)
    }
}

impl Index<usize> for ValueList {
    type Output = Value;

    fn index(&self, index: usize) -> &Value {
        &self.0[index]
    }
}

impl IntoIterator for ValueList {
    type Item = Value;
    type IntoIter = std::vec::IntoIter<Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a ValueList {
    type Item = &'a Value;
    type IntoIter = std::slice::Iter<'a, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl FromStr for ValueList {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_value_list(s)
    }
}

impl fmt::Display for ValueList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, value) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", value)?;
        }
        Ok(())
    }
}

/// Forward-only read position over the input.
struct Cursor<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn is_at_end(&self) -> bool {
        self.pos >= self.input.len()
    }

    fn skip_whitespace(&mut self) {
        self.pos += whitespace_len(self.rest());
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn bump(&mut self, c: char) {
        self.pos += c.len_utf8();
    }

    fn element(&mut self) -> Result<&'a str, ParseError> {
        let start = self.pos;
        let element = read_element(self.rest())
            .map_err(|_| ParseError::MalformedQuotedString { position: start })?
            .ok_or(ParseError::MalformedHeaderValue {
                position: start,
                reason: Malformed::MissingElement,
            })?;
        self.pos += element.consumed;
        Ok(element.text)
    }
}

/// Parse a field value into its list of values.
///
/// Any structural error rejects the whole input; no partial list is
/// returned.
pub fn parse_value_list(input: &str) -> Result<ValueList, ParseError> {
    let mut cursor = Cursor::new(input);
    let mut values = Vec::new();

    'values: loop {
        cursor.skip_whitespace();
        if cursor.is_at_end() {
            break;
        }

        let mut value = Value::default();

        loop {
            cursor.skip_whitespace();
            if cursor.is_at_end() {
                // only reachable after a trailing ';'
                values.push(value);
                break 'values;
            }

            let start = cursor.pos;
            let element = cursor.element()?;
            cursor.skip_whitespace();

            let mut delimiter = cursor.peek();
            if delimiter == Some('=') {
                cursor.bump('=');
                cursor.skip_whitespace();
                let param = cursor.element()?;
                value.pairs.insert(element.to_owned(), param.to_owned());
                cursor.skip_whitespace();
                delimiter = cursor.peek();
            } else if value.primary.is_some() || !value.pairs.is_empty() {
                return Err(ParseError::MalformedHeaderValue {
                    position: start,
                    reason: Malformed::UnexpectedPrimary {
                        element: element.to_owned(),
                    },
                });
            } else {
                value.primary = Some(element.to_owned());
            }

            match delimiter {
                None => {
                    values.push(value);
                    break 'values;
                }
                Some(',') => {
                    cursor.bump(',');
                    values.push(value);
                    continue 'values;
                }
                Some(';') => cursor.bump(';'),
                Some(c) => {
                    return Err(ParseError::MalformedHeaderValue {
                        position: cursor.pos,
                        reason: Malformed::UnexpectedDelimiter {
                            delimiter: c,
                            remainder: cursor.rest().to_owned(),
                        },
                    });
                }
            }
        }
    }

    Ok(ValueList(values))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(input: &str) -> ValueList {
        parse_value_list(input).unwrap()
    }

    #[test]
    fn test_single_token() {
        assert_eq!(parse("foo"), ValueList::from(vec![Value::with_primary("foo")]));
    }

    #[test]
    fn test_quoted_primary() {
        assert_eq!(parse("\"foo\""), ValueList::from(vec![Value::with_primary("foo")]));
        assert_eq!(parse("\"\""), ValueList::from(vec![Value::with_primary("")]));
    }

    #[test]
    fn test_multiple_values() {
        assert_eq!(
            parse("foo, bar"),
            ValueList::from(vec![Value::with_primary("foo"), Value::with_primary("bar")])
        );
    }

    #[test]
    fn test_primary_with_pairs() {
        let expected = ValueList::from(vec![
            Value::with_primary("foo").with_pair("charset", "UTF-8")
        ]);
        assert_eq!(parse("foo; charset=UTF-8"), expected);
        assert_eq!(parse("foo;charset=UTF-8"), expected);
        assert_eq!(parse("foo ; charset = UTF-8"), expected);
    }

    #[test]
    fn test_forwarded() {
        let list = parse("proto=https; host=example.com; for=5.6.7.84, for=5.6.7.8; proto=http");
        assert_eq!(
            list,
            ValueList::from(vec![
                Value::default()
                    .with_pair("proto", "https")
                    .with_pair("host", "example.com")
                    .with_pair("for", "5.6.7.84"),
                Value::default()
                    .with_pair("proto", "http")
                    .with_pair("for", "5.6.7.8"),
            ])
        );
        assert_eq!(list[0].primary(), None);
    }

    #[test]
    fn test_quoted_pair_values() {
        let list = parse(r#"for="[2001:db8:cafe::17]:4711"; by="a, b""#);
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].get("for"), Some("[2001:db8:cafe::17]:4711"));
        assert_eq!(list[0].get("by"), Some("a, b"));
    }

    #[test]
    fn test_empty_input() {
        assert!(parse("").is_empty());
        assert!(parse("  \t ").is_empty());
    }

    #[test]
    fn test_repeated_key_overwrites() {
        let list = parse("a=1; a=2");
        assert_eq!(list[0].get("a"), Some("2"));
        assert_eq!(list[0].pairs.len(), 1);
    }

    #[test]
    fn test_keys_keep_case() {
        let list = parse("Proto=https");
        assert_eq!(list[0].get("proto"), None);
        assert_eq!(list[0].get("Proto"), Some("https"));
        assert_eq!(list[0].get_ignore_ascii_case("PROTO"), Some("https"));
    }

    #[test]
    fn test_trailing_delimiters() {
        assert_eq!(parse("foo;"), ValueList::from(vec![Value::with_primary("foo")]));
        assert_eq!(parse("foo,"), ValueList::from(vec![Value::with_primary("foo")]));
        assert_eq!(parse("foo ; "), ValueList::from(vec![Value::with_primary("foo")]));
    }

    #[test]
    fn test_invalid_forwarded_is_rejected() {
        let input = "proto=https,host=localhost,foo=====99=";
        let err = parse_value_list(input).unwrap_err();
        assert_eq!(
            err,
            ParseError::MalformedHeaderValue {
                position: 31,
                reason: Malformed::MissingElement,
            }
        );
        assert_eq!(parse_value_list(input).unwrap_err(), err);
    }

    #[test]
    fn test_unexpected_delimiter() {
        let err = parse_value_list("foo bar").unwrap_err();
        assert_eq!(
            err,
            ParseError::MalformedHeaderValue {
                position: 4,
                reason: Malformed::UnexpectedDelimiter {
                    delimiter: 'b',
                    remainder: "bar".to_string(),
                },
            }
        );
        assert_eq!(
            err.to_string(),
            "malformed header value at byte 4: unexpected delimiter 'b' at 'bar'"
        );
    }

    #[test]
    fn test_missing_elements() {
        for input in [", foo", "foo,,bar", "=x", "a=;b=c", "foo; ;"] {
            match parse_value_list(input) {
                Err(ParseError::MalformedHeaderValue {
                    reason: Malformed::MissingElement,
                    ..
                }) => {}
                other => panic!("{input:?}: unexpected result {other:?}"),
            }
        }
    }

    #[test]
    fn test_second_primary_is_rejected() {
        let err = parse_value_list("foo; bar").unwrap_err();
        assert_eq!(
            err,
            ParseError::MalformedHeaderValue {
                position: 5,
                reason: Malformed::UnexpectedPrimary {
                    element: "bar".to_string(),
                },
            }
        );
        assert!(parse_value_list("a=b; c").is_err());
    }

    #[test]
    fn test_unterminated_quote_position() {
        assert_eq!(
            parse_value_list("a=1, b=\"open").unwrap_err(),
            ParseError::MalformedQuotedString { position: 7 }
        );
    }

    #[test]
    fn test_multibyte_delimiter() {
        let err = parse_value_list("a=1 é").unwrap_err();
        assert_eq!(err.position(), 4);
    }

    #[test]
    fn test_display() {
        let list = parse("foo ;charset=UTF-8,  for=\"[::1]:80\";proto=http");
        assert_eq!(list.to_string(), "foo; charset=UTF-8, for=\"[::1]:80\"; proto=http");
        assert_eq!(parse(&list.to_string()), list);
    }

    #[test]
    fn test_from_str() {
        let list: ValueList = "a, b".parse().unwrap();
        let primaries: Vec<_> = list.iter().filter_map(Value::primary).collect();
        assert_eq!(primaries, ["a", "b"]);
    }
}
