//! Repository listing, report runs, and deferred runs.

use std::sync::Arc;

use axum::extract::{Extension, Form, Path, State};
use axum::http::header::HeaderMap;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use minijinja::context;
use serde::{Deserialize, Serialize};

use crate::http::handlers::{
    failure_message, flash_redirect, fmt_time, forward_response, render_page, require_user,
};
use crate::http::server::AppState;
use crate::upstream::RequestScope;

/// Only repository entries of this type are reports the portal runs.
const REPORT_TYPE: &str = "FexFile";

#[derive(Serialize)]
struct ReportRow {
    name: String,
    description: String,
    created_at: String,
}

pub async fn list_reports(
    State(state): State<AppState>,
    Extension(scope): Extension<Arc<RequestScope>>,
    headers: HeaderMap,
) -> Response {
    let user = match require_user(&headers) {
        Ok(user) => user,
        Err(redirect) => return redirect,
    };
    let folder = state.upstream.repository_folder.clone();

    let listing = match scope.session().await {
        Ok(session) => session.list_repository(&folder, Some(REPORT_TYPE)).await,
        Err(err) => Err(err),
    };
    match listing {
        Ok(items) => {
            let reports: Vec<ReportRow> = items
                .into_iter()
                .map(|item| ReportRow {
                    name: item.name,
                    description: item.description.unwrap_or_default(),
                    created_at: fmt_time(item.created_at),
                })
                .collect();
            render_page(
                &state,
                &headers,
                &user,
                "reports.html",
                context! { folder => folder, reports => reports },
            )
        }
        Err(err) => flash_redirect("/home", &failure_message(&err)),
    }
}

/// Run a report and stream the render (HTML, PDF, image) back to the
/// browser unchanged. Failures yield a 502 rather than an empty body.
pub async fn run_report(
    State(state): State<AppState>,
    Extension(scope): Extension<Arc<RequestScope>>,
    Path(name): Path<String>,
    headers: HeaderMap,
) -> Response {
    if require_user(&headers).is_err() {
        return StatusCode::FORBIDDEN.into_response();
    }
    let report_path = format!("{}/{}", state.upstream.repository_folder, name);

    let result = match scope.session().await {
        Ok(session) => session.run_report(&report_path).await,
        Err(err) => Err(err),
    };
    match result {
        Ok(upstream) => forward_response(upstream),
        Err(err) => {
            tracing::warn!(report = %name, error = %err, "Report run failed");
            (StatusCode::BAD_GATEWAY, failure_message(&err)).into_response()
        }
    }
}

#[derive(Deserialize)]
pub struct DeferForm {
    #[serde(default)]
    pub description: String,
}

pub async fn defer_report(
    State(state): State<AppState>,
    Extension(scope): Extension<Arc<RequestScope>>,
    Path(name): Path<String>,
    headers: HeaderMap,
    Form(form): Form<DeferForm>,
) -> Response {
    if require_user(&headers).is_err() {
        return StatusCode::FORBIDDEN.into_response();
    }
    let report_path = format!("{}/{}", state.upstream.repository_folder, name);

    let result = match scope.session().await {
        Ok(session) => session.defer_report(&report_path, &form.description).await,
        Err(err) => Err(err),
    };
    match result {
        Ok(ticket) => flash_redirect(
            "/tickets",
            &format!("Deferred run queued as ticket {}", ticket.ticket_name),
        ),
        Err(err) => {
            tracing::warn!(report = %name, error = %err, "Deferred run failed");
            flash_redirect("/reports", &failure_message(&err))
        }
    }
}
