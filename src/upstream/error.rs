//! Error definitions for upstream calls.

use thiserror::Error;

/// Errors that can occur while talking to the upstream BI server.
///
/// The glue layer maps these to user-visible messages; only `sign_off`
/// swallows failures (cleanup never throws).
#[derive(Debug, Clone, Error)]
pub enum UpstreamError {
    /// Connection refused, DNS failure, or request timeout.
    #[error("could not reach the upstream service: {0}")]
    Transport(String),

    /// Body was not well-formed XML where XML was expected.
    #[error("malformed upstream response: {0}")]
    MalformedResponse(String),

    /// Sign-on completed at the transport level but the response
    /// carried no session token entry.
    #[error("sign-on did not yield a session token")]
    Authentication,

    /// Well-formed envelope with a non-success return code. Not a
    /// crash; reported to the user as an action-specific failure.
    #[error("upstream reported failure (return code {code})")]
    Business { code: String },
}

/// Result type for upstream operations.
pub type UpstreamResult<T> = Result<T, UpstreamError>;

impl From<reqwest::Error> for UpstreamError {
    fn from(err: reqwest::Error) -> Self {
        UpstreamError::Transport(err.to_string())
    }
}
