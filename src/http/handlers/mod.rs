//! Page handlers.
//!
//! Each handler pulls the request's [`RequestScope`] from extensions,
//! issues upstream calls through it, and renders a page or redirects
//! with a flash message. Failures never leak raw XML; they map to
//! human-readable text via [`failure_message`].

pub mod assets;
pub mod auth;
pub mod reports;
pub mod schedules;
pub mod tickets;

use axum::body::Body;
use axum::http::header::{HeaderMap, SET_COOKIE};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect, Response};
use chrono::{DateTime, Local};
use minijinja::{context, Value};

use crate::http::cookies;
use crate::http::server::AppState;
use crate::upstream::UpstreamError;

/// Gate for pages that require a signed-in browser session.
pub(crate) fn require_user(headers: &HeaderMap) -> Result<String, Response> {
    cookies::user_name(headers).ok_or_else(|| Redirect::to("/").into_response())
}

/// Redirect with a one-shot flash message.
pub(crate) fn flash_redirect(location: &str, message: &str) -> Response {
    let mut response = Redirect::to(location).into_response();
    response
        .headers_mut()
        .append(SET_COOKIE, cookies::set(cookies::FLASH_COOKIE, message));
    response
}

/// Map an upstream error to the message shown to the end user.
pub(crate) fn failure_message(err: &UpstreamError) -> String {
    match err {
        UpstreamError::Transport(_) => {
            "Could not reach the reporting service. Please try again later.".to_string()
        }
        UpstreamError::MalformedResponse(_) => {
            "The reporting service returned an unreadable response.".to_string()
        }
        UpstreamError::Authentication => {
            "Sign-on to the reporting service failed.".to_string()
        }
        UpstreamError::Business { code } => {
            format!("The reporting service rejected the request (code {}).", code)
        }
    }
}

/// Render a template with the shared page context (user, flash).
///
/// Displaying a flash message consumes it: the response clears the
/// cookie.
pub(crate) fn render_page(
    state: &AppState,
    headers: &HeaderMap,
    user: &str,
    template: &str,
    ctx: Value,
) -> Response {
    let flash = cookies::flash_message(headers);
    let had_flash = flash.is_some();
    let ctx = context! { user => user, flash => flash, ..ctx };

    match state.templates.render(template, ctx) {
        Ok(html) => {
            let mut response = Html(html).into_response();
            if had_flash {
                response
                    .headers_mut()
                    .append(SET_COOKIE, cookies::clear(cookies::FLASH_COOKIE));
            }
            response
        }
        Err(e) => {
            tracing::error!(template = %template, error = %e, "Template rendering failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "Page rendering failed").into_response()
        }
    }
}

/// Forward an upstream response to the browser byte-for-byte.
///
/// Bodies are streamed, never buffered, and never re-encoded; only
/// hop-by-hop headers are dropped. The upstream status code is
/// preserved.
pub(crate) fn forward_response(upstream: reqwest::Response) -> Response {
    let status = upstream.status();
    let mut builder = Response::builder().status(status);
    for (name, value) in upstream.headers() {
        if !is_hop_by_hop(name.as_str()) {
            builder = builder.header(name, value);
        }
    }
    builder
        .body(Body::from_stream(upstream.bytes_stream()))
        .map(IntoResponse::into_response)
        .unwrap_or_else(|_| {
            (StatusCode::BAD_GATEWAY, "Upstream response could not be forwarded").into_response()
        })
}

fn is_hop_by_hop(name: &str) -> bool {
    matches!(
        name,
        "connection"
            | "keep-alive"
            | "proxy-authenticate"
            | "proxy-authorization"
            | "te"
            | "trailers"
            | "transfer-encoding"
            | "upgrade"
    )
}

/// Format an optional upstream timestamp for display.
pub(crate) fn fmt_time(value: Option<DateTime<Local>>) -> String {
    match value {
        Some(time) => time.format("%Y-%m-%d %H:%M:%S").to_string(),
        None => "never".to_string(),
    }
}
