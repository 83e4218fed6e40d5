//! Schedule pages: listing, detail, execution log.

use std::sync::Arc;

use axum::extract::{Extension, Path, State};
use axum::http::header::HeaderMap;
use axum::response::Response;
use minijinja::context;
use serde::Serialize;

use crate::http::handlers::{failure_message, flash_redirect, fmt_time, render_page, require_user};
use crate::http::server::AppState;
use crate::upstream::{LogEntry, RequestScope, ScheduleSummary};

#[derive(Serialize)]
struct ScheduleView {
    name: String,
    owner: String,
    description: String,
    send_method: String,
    destination_address: String,
    last_executed_at: String,
    next_run_at: String,
    procedures: Vec<String>,
}

impl ScheduleView {
    fn from(schedule: ScheduleSummary) -> Self {
        Self {
            name: schedule.name,
            owner: schedule.owner.unwrap_or_default(),
            description: schedule.description.unwrap_or_default(),
            send_method: schedule.send_method.unwrap_or_default(),
            destination_address: schedule.destination_address.unwrap_or_default(),
            last_executed_at: fmt_time(schedule.last_executed_at),
            next_run_at: fmt_time(schedule.next_run_at),
            procedures: schedule.procedures,
        }
    }
}

#[derive(Serialize)]
struct LogRow {
    started_at: String,
    ended_at: String,
    error_type: String,
    owner: String,
}

impl LogRow {
    fn from(entry: LogEntry) -> Self {
        Self {
            started_at: fmt_time(entry.started_at),
            ended_at: fmt_time(entry.ended_at),
            error_type: entry.error_type.unwrap_or_default(),
            owner: entry.owner.unwrap_or_default(),
        }
    }
}

pub async fn list_schedules(
    State(state): State<AppState>,
    Extension(scope): Extension<Arc<RequestScope>>,
    headers: HeaderMap,
) -> Response {
    let user = match require_user(&headers) {
        Ok(user) => user,
        Err(redirect) => return redirect,
    };

    let result = match scope.session().await {
        Ok(session) => session.list_schedules().await,
        Err(err) => Err(err),
    };
    match result {
        Ok(schedules) => {
            let schedules: Vec<ScheduleView> =
                schedules.into_iter().map(ScheduleView::from).collect();
            render_page(
                &state,
                &headers,
                &user,
                "schedules.html",
                context! { schedules => schedules },
            )
        }
        Err(err) => flash_redirect("/home", &failure_message(&err)),
    }
}

pub async fn schedule_detail(
    State(state): State<AppState>,
    Extension(scope): Extension<Arc<RequestScope>>,
    Path(name): Path<String>,
    headers: HeaderMap,
) -> Response {
    let user = match require_user(&headers) {
        Ok(user) => user,
        Err(redirect) => return redirect,
    };

    let result = match scope.session().await {
        Ok(session) => session.get_schedule(&name).await,
        Err(err) => Err(err),
    };
    match result {
        Ok(schedule) => render_page(
            &state,
            &headers,
            &user,
            "schedule_detail.html",
            context! { schedule => ScheduleView::from(schedule) },
        ),
        Err(err) => flash_redirect("/schedules", &failure_message(&err)),
    }
}

pub async fn schedule_log(
    State(state): State<AppState>,
    Extension(scope): Extension<Arc<RequestScope>>,
    Path(name): Path<String>,
    headers: HeaderMap,
) -> Response {
    let user = match require_user(&headers) {
        Ok(user) => user,
        Err(redirect) => return redirect,
    };

    let result = match scope.session().await {
        Ok(session) => session.schedule_log(&name).await,
        Err(err) => Err(err),
    };
    match result {
        Ok(entries) => {
            let entries: Vec<LogRow> = entries.into_iter().map(LogRow::from).collect();
            render_page(
                &state,
                &headers,
                &user,
                "schedule_log.html",
                context! { name => name, entries => entries },
            )
        }
        Err(err) => flash_redirect("/schedules", &failure_message(&err)),
    }
}
