//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges and formats (addresses, schemes, paths)
//! - Compile path rewrite patterns once, before the server starts
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: EdgeConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;
use tracing_subscriber::EnvFilter;

use crate::config::schema::EdgeConfig;
use crate::requesturi::{is_supported_scheme, RewriteError, RewritePath};
use crate::security::headers::HSTS_DEFAULT_MAX_AGE;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("listener.bind_address {0:?} is not a socket address")]
    BindAddress(String),

    #[error("listener.default_scheme {0:?} must be \"http\" or \"https\"")]
    DefaultScheme(String),

    #[error("listener.request_timeout_secs must be greater than 0")]
    RequestTimeout,

    #[error("forwarding.rewrites: {0}")]
    Rewrite(#[from] RewriteError),

    #[error("auth.require is set but auth.schemes is empty")]
    RequireWithoutSchemes,

    #[error("auth.realm must not be empty")]
    EmptyRealm,

    #[error("cors.endpoints[{index}].path {path:?} must start with '/'")]
    CorsPath { index: usize, path: String },

    #[error("security.hsts_preload requires hsts_include_subdomains and a max age of at least one year")]
    HstsPreload,

    #[error("observability.log_level {0:?} is not a valid filter")]
    LogLevel(String),
}

/// Check `config` for semantic errors.
pub fn validate_config(config: &EdgeConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let listener = &config.listener;
    if listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(listener.bind_address.clone()));
    }
    if !is_supported_scheme(&listener.default_scheme) {
        errors.push(ValidationError::DefaultScheme(listener.default_scheme.clone()));
    }
    if listener.request_timeout_secs == 0 {
        errors.push(ValidationError::RequestTimeout);
    }

    let rules = config
        .forwarding
        .rewrites
        .iter()
        .map(|r| (r.pattern.as_str(), r.target.clone()));
    if let Err(e) = RewritePath::new(rules) {
        errors.push(e.into());
    }

    let auth = &config.auth;
    if auth.require && auth.schemes.is_empty() {
        errors.push(ValidationError::RequireWithoutSchemes);
    }
    if auth.require && auth.realm.is_empty() {
        errors.push(ValidationError::EmptyRealm);
    }

    if config.cors.enabled {
        for (index, endpoint) in config.cors.endpoints.iter().enumerate() {
            if !endpoint.path.starts_with('/') {
                errors.push(ValidationError::CorsPath {
                    index,
                    path: endpoint.path.clone(),
                });
            }
        }
    }

    let security = &config.security;
    if security.hsts
        && security.hsts_preload
        && (!security.hsts_include_subdomains
            || security.hsts_max_age_secs < HSTS_DEFAULT_MAX_AGE.as_secs())
    {
        errors.push(ValidationError::HstsPreload);
    }

    if EnvFilter::try_new(&config.observability.log_level).is_err() {
        errors.push(ValidationError::LogLevel(config.observability.log_level.clone()));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::RewriteRule;
    use crate::security::cors::CorsEndpoint;

    #[test]
    fn test_default_config_is_valid() {
        assert_eq!(validate_config(&EdgeConfig::default()), Ok(()));
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = EdgeConfig::default();
        config.listener.bind_address = "not-an-address".to_string();
        config.listener.default_scheme = "ftp".to_string();
        config.auth.require = true;
        config.forwarding.rewrites.push(RewriteRule {
            pattern: "app/*".to_string(),
            target: "/index.html".to_string(),
        });
        config.cors.enabled = true;
        config.cors.endpoints.push(CorsEndpoint {
            path: "api".to_string(),
            ..CorsEndpoint::default()
        });

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![
                ValidationError::BindAddress("not-an-address".to_string()),
                ValidationError::DefaultScheme("ftp".to_string()),
                ValidationError::Rewrite(RewriteError::RelativePattern("app/*".to_string())),
                ValidationError::RequireWithoutSchemes,
                ValidationError::CorsPath {
                    index: 0,
                    path: "api".to_string(),
                },
            ]
        );
    }

    #[test]
    fn test_hsts_preload_needs_subdomains() {
        let mut config = EdgeConfig::default();
        config.security.hsts = true;
        config.security.hsts_preload = true;
        assert_eq!(validate_config(&config), Err(vec![ValidationError::HstsPreload]));

        config.security.hsts_include_subdomains = true;
        assert_eq!(validate_config(&config), Ok(()));
    }
}
