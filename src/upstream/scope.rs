//! Request-scoped session lifecycle.
//!
//! # Responsibilities
//! - Create at most one [`UpstreamSession`] per inbound request,
//!   signing on lazily the first time a handler asks for it
//! - Guarantee sign-off on every exit path: normal completion, error
//!   responses, and aborted requests whose futures are dropped
//!
//! # Design Decisions
//! - The scope travels in request extensions; handlers extract it,
//!   the middleware calls [`RequestScope::finish`] after the handler
//! - A failed sign-on is cached so a second `session()` call within
//!   the same request returns the same error instead of re-dialing
//!   (sign-on failures are terminal for that request)
//! - Drop fallback spawns the sign-off when the middleware future
//!   never got to run it

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::config::{CredentialsConfig, UpstreamConfig};
use crate::upstream::error::UpstreamResult;
use crate::upstream::session::UpstreamSession;

enum ScopeState {
    Idle,
    Active(Arc<UpstreamSession>),
    Failed(crate::upstream::error::UpstreamError),
}

/// Owns the one upstream session of a single inbound request.
pub struct RequestScope {
    upstream: UpstreamConfig,
    credentials: CredentialsConfig,
    state: tokio::sync::Mutex<ScopeState>,
    finished: AtomicBool,
}

impl RequestScope {
    pub fn new(upstream: UpstreamConfig, credentials: CredentialsConfig) -> Self {
        Self {
            upstream,
            credentials,
            state: tokio::sync::Mutex::new(ScopeState::Idle),
            finished: AtomicBool::new(false),
        }
    }

    /// Return this request's session, creating and signing it on the
    /// first time. Subsequent calls within the same request return the
    /// same instance; there is never a duplicate sign-on.
    pub async fn session(&self) -> UpstreamResult<Arc<UpstreamSession>> {
        let mut state = self.state.lock().await;
        match &*state {
            ScopeState::Active(session) => Ok(session.clone()),
            ScopeState::Failed(err) => Err(err.clone()),
            ScopeState::Idle => {
                let result = self.open_session().await;
                match result {
                    Ok(session) => {
                        *state = ScopeState::Active(session.clone());
                        Ok(session)
                    }
                    Err(err) => {
                        *state = ScopeState::Failed(err.clone());
                        Err(err)
                    }
                }
            }
        }
    }

    async fn open_session(&self) -> UpstreamResult<Arc<UpstreamSession>> {
        let session = Arc::new(UpstreamSession::new(&self.upstream)?);
        session
            .sign_on(&self.credentials.user_name, &self.credentials.password)
            .await?;
        Ok(session)
    }

    /// Sign off the session if one was created. Invoked by the scope
    /// middleware exactly once per request, after the handler ran;
    /// a no-op when no handler asked for a session.
    pub async fn finish(&self) {
        if self.finished.swap(true, Ordering::SeqCst) {
            return;
        }
        let mut state = self.state.lock().await;
        if let ScopeState::Active(session) = std::mem::replace(&mut *state, ScopeState::Idle) {
            session.sign_off().await;
        }
    }
}

impl Drop for RequestScope {
    fn drop(&mut self) {
        if self.finished.load(Ordering::SeqCst) {
            return;
        }
        // The request future was dropped before finish() ran (client
        // abort). Cleanup still has to happen.
        let state = std::mem::replace(self.state.get_mut(), ScopeState::Idle);
        if let ScopeState::Active(session) = state {
            if let Ok(handle) = tokio::runtime::Handle::try_current() {
                handle.spawn(async move {
                    session.sign_off().await;
                });
            }
        }
    }
}
