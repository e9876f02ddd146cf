//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware stack)
//!     → requesturi (absolute URL from Host / proxy headers)
//!     → security (credentials, CORS, response headers)
//!     → inspection handler (JSON echo)
//!     → Send to client
//! ```

pub mod server;

pub use server::{EdgeServer, ServerError};
