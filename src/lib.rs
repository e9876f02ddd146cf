//! HTTP edge toolkit: structured header parsing and the middleware built on it.

pub mod config;
pub mod header;
pub mod http;
pub mod observability;
pub mod requesturi;
pub mod security;

pub use config::schema::EdgeConfig;
pub use header::{parse_value_list, ParseError, Value, ValueList};
pub use http::EdgeServer;
