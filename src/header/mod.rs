//! Structured header field values.
//!
//! # Data Flow
//! ```text
//! raw field value ("proto=https; host=a, for=1.2.3.4")
//!     → lexer.rs (tokens, quoted strings, whitespace)
//!     → value_list.rs (comma units, ';' groups, key=value pairs)
//!     → ValueList (immutable, handed to header consumers)
//! ```
//!
//! # Design Decisions
//! - Grammar follows RFC 7230 §3.2.6 field value components
//! - Single forward cursor, no backtracking: O(n) in input bytes
//! - Any malformed unit rejects the whole field value
//! - Keys keep the case they were written in; consumers normalize

pub mod error;
pub mod lexer;
pub mod value_list;

pub use error::{Malformed, ParseError};
pub use lexer::{read_quoted_string, scan_token};
pub use value_list::{parse_value_list, Value, ValueList};
