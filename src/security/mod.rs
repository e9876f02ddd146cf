//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → auth.rs (extract credentials, optionally require them)
//!     → cors.rs (answer pre-flight, grant cross-origin access)
//!     → Pass to handler
//! Outgoing response:
//!     → cors.rs (Access-Control-Allow-*)
//!     → headers.rs (CSP, HSTS, nosniff, frame options)
//! ```
//!
//! # Design Decisions
//! - Per-request results travel in request extensions, never globals
//! - Header values are validated when state is built, not per request

pub mod auth;
pub mod cors;
pub mod headers;

pub use auth::{
    authorization_middleware, require_authorization_middleware, AuthScheme, AuthState,
    AuthenticationChallenge, Authorization, BearerToken, ChallengeState, UsernamePassword,
};
pub use cors::{cors_middleware, CorsEndpoint, CorsState};
pub use headers::{security_headers_middleware, SecurityHeaders, SecurityHeadersState};
