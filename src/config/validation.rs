//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, ports valid)
//!
//! # Design Decisions
//! - Returns all validation errors, not just the first
//! - Validation is a pure function: PortalConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use crate::config::schema::PortalConfig;

/// One semantic problem found in a config.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate a loaded configuration.
pub fn validate_config(config: &PortalConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError {
            field: "listener.bind_address",
            message: format!("'{}' is not a socket address", config.listener.bind_address),
        });
    }
    if config.listener.request_timeout_secs == 0 {
        errors.push(ValidationError {
            field: "listener.request_timeout_secs",
            message: "must be greater than zero".to_string(),
        });
    }

    if config.upstream.protocol != "http" && config.upstream.protocol != "https" {
        errors.push(ValidationError {
            field: "upstream.protocol",
            message: format!("'{}' is not http or https", config.upstream.protocol),
        });
    }
    if config.upstream.host.is_empty() {
        errors.push(ValidationError {
            field: "upstream.host",
            message: "must not be empty".to_string(),
        });
    }
    if config.upstream.port == 0 {
        errors.push(ValidationError {
            field: "upstream.port",
            message: "must be greater than zero".to_string(),
        });
    }
    let root = &config.upstream.service_root;
    if root.is_empty() || root.starts_with('/') || root.ends_with('/') {
        errors.push(ValidationError {
            field: "upstream.service_root",
            message: "must be non-empty with no leading or trailing slash".to_string(),
        });
    }
    if config.upstream.timeout_secs == 0 {
        errors.push(ValidationError {
            field: "upstream.timeout_secs",
            message: "must be greater than zero".to_string(),
        });
    }

    if config.credentials.user_name.is_empty() {
        errors.push(ValidationError {
            field: "credentials.user_name",
            message: "must not be empty".to_string(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
