//! BI Portal library.
//!
//! A thin web front-end that proxies browser requests into a
//! WebFOCUS-style BI server's REST API: form submissions become
//! authenticated upstream calls, XML envelopes become HTML pages.

pub mod config;
pub mod http;
pub mod render;
pub mod upstream;

pub use config::PortalConfig;
pub use http::PortalServer;
pub use upstream::{RequestScope, UpstreamSession};
