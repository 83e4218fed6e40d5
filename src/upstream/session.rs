//! Authenticated upstream session.
//!
//! # Responsibilities
//! - Sign on against the upstream control endpoint and capture the
//!   CSRF-style session token
//! - Attach the token to every subsequent authorized call
//! - Sign off at end of request (best-effort, never fails the request)
//! - Provide one generic call primitive plus a streaming variant for
//!   binary payloads
//!
//! # Design Decisions
//! - Each session owns a dedicated `reqwest` client with its own
//!   cookie jar; the upstream's session cookie must never leak across
//!   inbound requests
//! - Automatic decompression stays disabled so proxied bodies are
//!   forwarded byte-for-byte with their original encoding headers
//! - No automatic retries: several upstream actions (deferred runs)
//!   are not idempotent
//! - `sign_off` clears the token before the network call so a failing
//!   sign-off cannot leave stale credentials in memory

use std::sync::Mutex;
use std::time::Duration;

use reqwest::header::HeaderMap;
use reqwest::{Method, StatusCode};

use crate::config::UpstreamConfig;
use crate::upstream::error::{UpstreamError, UpstreamResult};
use crate::upstream::xml;

/// Form field (POST) / query parameter (GET) the token is sent under.
pub const TOKEN_FIELD: &str = "IBIWF_SES_AUTH_TOKEN";

/// Key of the properties entry that carries the token in the sign-on
/// response.
const TOKEN_ENTRY_KEY: &str = "IBI_CSRF_Token_Value";

/// Result of one non-streaming upstream call.
#[derive(Debug)]
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

/// One authenticated connection to the upstream service, living for
/// the duration of a single inbound request.
///
/// The auth token is present if and only if sign-on has succeeded and
/// sign-off has not yet been called.
#[derive(Debug)]
pub struct UpstreamSession {
    client: reqwest::Client,
    config: UpstreamConfig,
    token: Mutex<Option<String>>,
}

impl UpstreamSession {
    /// Create an unauthenticated session for the given upstream.
    pub fn new(config: &UpstreamConfig) -> UpstreamResult<Self> {
        let client = reqwest::Client::builder()
            .cookie_store(true)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| UpstreamError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            config: config.clone(),
            token: Mutex::new(None),
        })
    }

    pub fn config(&self) -> &UpstreamConfig {
        &self.config
    }

    /// Current auth token, if sign-on has succeeded.
    pub fn token(&self) -> Option<String> {
        self.token.lock().expect("token mutex poisoned").clone()
    }

    fn control_url(&self) -> String {
        format!("{}{}", self.config.base_url(), self.config.control_path())
    }

    /// Authenticate against the upstream control endpoint.
    ///
    /// On a well-formed response the token is extracted from the
    /// `properties` entry list and stored for subsequent calls. A
    /// response that is not XML fails with
    /// [`UpstreamError::MalformedResponse`]; a response without the
    /// token entry fails with [`UpstreamError::Authentication`]. Both
    /// propagate so callers never proceed with an unset token.
    pub async fn sign_on(&self, user_name: &str, password: &str) -> UpstreamResult<()> {
        let form = [
            ("IBIRS_action", "signOn"),
            ("IBIRS_userName", user_name),
            ("IBIRS_password", password),
        ];
        let response = self
            .client
            .post(self.control_url())
            .form(&form)
            .send()
            .await?;
        let body = response.bytes().await?;

        let root = xml::parse(&body)?;
        let token = root
            .child("properties")
            .and_then(|properties| {
                properties
                    .children
                    .iter()
                    .find(|entry| entry.name == "entry" && entry.attr("key") == Some(TOKEN_ENTRY_KEY))
            })
            .and_then(|entry| entry.attr("value"))
            .ok_or(UpstreamError::Authentication)?
            .to_string();

        *self.token.lock().expect("token mutex poisoned") = Some(token);
        tracing::debug!(host = %self.config.host, "upstream sign-on complete");
        Ok(())
    }

    /// Sign off from the upstream.
    ///
    /// Best-effort cleanup: the token is cleared unconditionally
    /// first, the network call failure is logged and swallowed, and
    /// calling this on a session that never signed on still performs
    /// the call without error (the upstream tolerates redundant
    /// sign-off).
    pub async fn sign_off(&self) {
        self.token.lock().expect("token mutex poisoned").take();

        let form = [("IBIRS_action", "signOff")];
        match self.client.post(self.control_url()).form(&form).send().await {
            Ok(_) => tracing::debug!(host = %self.config.host, "upstream sign-off complete"),
            Err(e) => {
                tracing::warn!(host = %self.config.host, error = %e, "upstream sign-off failed; discarding")
            }
        }
    }

    /// Issue one upstream call and buffer the response.
    ///
    /// When a token is held it is injected under [`TOKEN_FIELD`]: into
    /// the form body when one is sent, into the query otherwise. The
    /// token attaches to every authorized call; there are no
    /// per-endpoint exemptions.
    pub async fn call(
        &self,
        method: Method,
        path: &str,
        query: &[(String, String)],
        form: Option<&[(String, String)]>,
    ) -> UpstreamResult<UpstreamResponse> {
        let response = self.request(method, path, query, form).send().await?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await?.to_vec();
        Ok(UpstreamResponse {
            status,
            headers,
            body,
        })
    }

    /// Issue one upstream call and hand back the raw response for
    /// streaming. Used for binary payloads (report renders, images,
    /// static assets) that must reach the browser byte-for-byte.
    pub async fn call_streaming(
        &self,
        method: Method,
        path: &str,
        query: &[(String, String)],
        form: Option<&[(String, String)]>,
    ) -> UpstreamResult<reqwest::Response> {
        Ok(self.request(method, path, query, form).send().await?)
    }

    fn request(
        &self,
        method: Method,
        path: &str,
        query: &[(String, String)],
        form: Option<&[(String, String)]>,
    ) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.config.base_url(), path);
        let mut builder = self.client.request(method, url).query(query);
        let token = self.token();

        match form {
            Some(fields) => {
                let mut fields = fields.to_vec();
                if let Some(token) = token {
                    fields.push((TOKEN_FIELD.to_string(), token));
                }
                builder = builder.form(&fields);
            }
            None => {
                if let Some(token) = token {
                    builder = builder.query(&[(TOKEN_FIELD, token.as_str())]);
                }
            }
        }
        builder
    }
}
