//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from config
//! files, and every field has a default so a minimal (or missing)
//! config file still yields a runnable portal.

use serde::{Deserialize, Serialize};

/// Root configuration for the portal.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct PortalConfig {
    /// Listener configuration (bind address, inbound timeout).
    pub listener: ListenerConfig,

    /// Upstream BI server connection target.
    pub upstream: UpstreamConfig,

    /// Service account used for upstream sign-on.
    pub credentials: CredentialsConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "127.0.0.1:5000").
    pub bind_address: String,

    /// Inbound request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:5000".to_string(),
            request_timeout_secs: 60,
        }
    }
}

/// Upstream BI server connection target.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// "http" or "https".
    pub protocol: String,

    /// Upstream host name.
    pub host: String,

    /// Upstream port.
    pub port: u16,

    /// Path prefix of the REST service (no leading or trailing slash).
    pub service_root: String,

    /// Repository folder listed on the reports page.
    pub repository_folder: String,

    /// Per-call timeout in seconds; a hung upstream must not stall a
    /// request indefinitely.
    pub timeout_secs: u64,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            protocol: "http".to_string(),
            host: "localhost".to_string(),
            port: 8080,
            service_root: "ibi_apps/rs".to_string(),
            repository_folder: "IBFS:/WFC/Repository/Public".to_string(),
            timeout_secs: 30,
        }
    }
}

impl UpstreamConfig {
    /// Base URL of the upstream server, without a trailing slash.
    pub fn base_url(&self) -> String {
        format!("{}://{}:{}", self.protocol, self.host, self.port)
    }

    /// Absolute path of the sign-on/sign-off control endpoint.
    pub fn control_path(&self) -> String {
        format!("/{}/ibfs", self.service_root)
    }
}

/// Service account for upstream sign-on.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CredentialsConfig {
    pub user_name: String,
    pub password: String,
}

impl Default for CredentialsConfig {
    fn default() -> Self {
        Self {
            user_name: "admin".to_string(),
            password: "admin".to_string(),
        }
    }
}
