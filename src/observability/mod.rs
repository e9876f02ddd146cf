//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → tracing events with structured fields
//!     → logging.rs (filter + text or JSON formatter)
//!
//! HTTP requests:
//!     → tower_http TraceLayer spans (method, uri, status, latency)
//! ```

pub mod logging;

pub use logging::init_logging;
