//! Deferred ticket pages: listing, status, deletion.

use std::sync::Arc;

use axum::extract::{Extension, Path, State};
use axum::http::header::HeaderMap;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use minijinja::context;
use serde::Serialize;

use crate::http::handlers::{
    failure_message, flash_redirect, fmt_time, render_page, require_user,
};
use crate::http::server::AppState;
use crate::upstream::{DeferredTicket, RequestScope};

#[derive(Serialize)]
struct TicketRow {
    ticket_name: String,
    report_name: String,
    description: String,
    created_at: String,
    status: String,
}

impl TicketRow {
    fn from(ticket: DeferredTicket) -> Self {
        Self {
            ticket_name: ticket.ticket_name,
            report_name: ticket.report_name.unwrap_or_default(),
            description: ticket.description.unwrap_or_default(),
            created_at: fmt_time(ticket.created_at),
            status: if ticket.status.is_ready() {
                "ready".to_string()
            } else {
                "not ready".to_string()
            },
        }
    }
}

pub async fn list_tickets(
    State(state): State<AppState>,
    Extension(scope): Extension<Arc<RequestScope>>,
    headers: HeaderMap,
) -> Response {
    let user = match require_user(&headers) {
        Ok(user) => user,
        Err(redirect) => return redirect,
    };

    let result = match scope.session().await {
        Ok(session) => session.list_tickets().await,
        Err(err) => Err(err),
    };
    match result {
        Ok(tickets) => {
            let tickets: Vec<TicketRow> = tickets.into_iter().map(TicketRow::from).collect();
            render_page(
                &state,
                &headers,
                &user,
                "tickets.html",
                context! { tickets => tickets },
            )
        }
        Err(err) => flash_redirect("/home", &failure_message(&err)),
    }
}

pub async fn ticket_detail(
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
        Ok(session) => session.ticket_status(&name).await,
        Err(err) => Err(err),
    };
    match result {
        Ok(ticket) => render_page(
            &state,
            &headers,
            &user,
            "ticket.html",
            context! { ticket => TicketRow::from(ticket) },
        ),
        Err(err) => flash_redirect("/tickets", &failure_message(&err)),
    }
}

pub async fn delete_ticket(
    Extension(scope): Extension<Arc<RequestScope>>,
    Path(name): Path<String>,
    headers: HeaderMap,
) -> Response {
    if require_user(&headers).is_err() {
        return StatusCode::FORBIDDEN.into_response();
    }

    let result = match scope.session().await {
        Ok(session) => session.delete_ticket(&name).await,
        Err(err) => Err(err),
    };
    match result {
        Ok(()) => flash_redirect("/tickets", &format!("Ticket {} deleted", name)),
        Err(err) => flash_redirect("/tickets", &failure_message(&err)),
    }
}
