//! HTTP front-end subsystem.
//!
//! # Data Flow
//! ```text
//! browser request
//!     → server.rs (router, scope middleware, timeout, tracing)
//!     → handlers/ (pages and actions)
//!     → upstream subsystem (session, typed ops)
//!     → render (HTML) or byte-for-byte passthrough
//! ```

pub mod cookies;
pub mod handlers;
pub mod server;

pub use server::{AppState, PortalServer};
