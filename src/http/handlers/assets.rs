//! Static asset proxying.
//!
//! The upstream web UI serves images, stylesheets, and scripts that
//! report renders reference. They are forwarded byte-for-byte: no
//! decompression, no header rewriting beyond hop-by-hop stripping.

use std::sync::Arc;

use axum::extract::{Extension, Path, RawQuery};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::http::handlers::{failure_message, forward_response};
use crate::upstream::RequestScope;

pub async fn proxy_asset(
    Extension(scope): Extension<Arc<RequestScope>>,
    Path(path): Path<String>,
    RawQuery(query): RawQuery,
) -> Response {
    let asset_path = match &query {
        Some(query) => format!("/{}?{}", path, query),
        None => format!("/{}", path),
    };

    let result = match scope.session().await {
        Ok(session) => session.fetch_asset(&asset_path).await,
        Err(err) => Err(err),
    };
    match result {
        Ok(upstream) => forward_response(upstream),
        Err(err) => {
            tracing::warn!(asset = %path, error = %err, "Asset fetch failed");
            (StatusCode::BAD_GATEWAY, failure_message(&err)).into_response()
        }
    }
}
