//! Upstream BI server integration subsystem.
//!
//! # Data Flow
//! ```text
//! inbound request
//!     → scope.rs (one lazy session per request, sign-off guaranteed)
//!     → session.rs (sign-on, token attach, generic call primitive)
//!     → xml.rs (envelope parse, item projection)
//!     → types.rs (ticket / schedule / log value objects)
//!     → handler renders a page
//! ```
//!
//! # Design Decisions
//! - One session per inbound request; tokens are never cached or
//!   shared across requests
//! - A single generic `call` primitive plus thin typed helpers in
//!   ops.rs, instead of one near-duplicate method per upstream action
//! - Sign-off is best-effort cleanup: it clears the token first and
//!   swallows network failures
//! - Every upstream attribute is optional; absence is a modeled case

pub mod error;
pub mod ops;
pub mod scope;
pub mod session;
pub mod types;
pub mod xml;

pub use error::{UpstreamError, UpstreamResult};
pub use scope::RequestScope;
pub use session::{UpstreamResponse, UpstreamSession};
pub use types::{DeferredTicket, LogEntry, RepositoryItem, ScheduleSummary, TicketStatus};
pub use xml::Envelope;
