//! Shared utilities for integration testing: an in-process mock of
//! the upstream BI server that speaks the XML envelope contract and
//! counts sign-on/sign-off traffic.
#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use axum::body::Bytes;
use axum::extract::{RawQuery, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::any;
use axum::Router;
use tokio::net::TcpListener;

/// Fixed payload served for asset requests.
pub const ASSET_BYTES: &[u8] = b"\x89PNG\r\n\x1a\nnot-really-a-png";

/// Behavior knobs for one mock instance.
#[derive(Clone)]
pub struct MockOptions {
    /// Token issued at sign-on; `None` omits the token entry entirely.
    pub token: Option<String>,
    /// Return code for `runDeferred` responses.
    pub defer_return_code: String,
    /// Repository listing entries as (name, type) pairs.
    pub listing: Vec<(&'static str, &'static str)>,
}

impl Default for MockOptions {
    fn default() -> Self {
        Self {
            token: Some("ABC123".to_string()),
            defer_return_code: "10000".to_string(),
            listing: vec![
                ("R1", "FexFile"),
                ("Sales", "Folder"),
                ("R2", "FexFile"),
                ("R3", "FexFile"),
            ],
        }
    }
}

/// Handle to a spawned mock upstream.
pub struct MockUpstream {
    pub addr: SocketAddr,
    pub sign_ons: Arc<AtomicU32>,
    pub sign_offs: Arc<AtomicU32>,
    /// Token value observed on each authorized (non-control) call.
    pub tokens_seen: Arc<Mutex<Vec<Option<String>>>>,
    /// Ticket names the mock has actually queued.
    pub deferred: Arc<Mutex<Vec<String>>>,
}

impl MockUpstream {
    pub fn sign_on_count(&self) -> u32 {
        self.sign_ons.load(Ordering::SeqCst)
    }

    pub fn sign_off_count(&self) -> u32 {
        self.sign_offs.load(Ordering::SeqCst)
    }
}

#[derive(Clone)]
struct MockState {
    opts: MockOptions,
    sign_ons: Arc<AtomicU32>,
    sign_offs: Arc<AtomicU32>,
    tokens_seen: Arc<Mutex<Vec<Option<String>>>>,
    deferred: Arc<Mutex<Vec<String>>>,
}

/// Start a mock upstream on an ephemeral port.
pub async fn spawn_mock_upstream(opts: MockOptions) -> MockUpstream {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let state = MockState {
        opts,
        sign_ons: Arc::new(AtomicU32::new(0)),
        sign_offs: Arc::new(AtomicU32::new(0)),
        tokens_seen: Arc::new(Mutex::new(Vec::new())),
        deferred: Arc::new(Mutex::new(Vec::new())),
    };
    let handle = MockUpstream {
        addr,
        sign_ons: state.sign_ons.clone(),
        sign_offs: state.sign_offs.clone(),
        tokens_seen: state.tokens_seen.clone(),
        deferred: state.deferred.clone(),
    };

    let app = Router::new()
        .route("/ibi_apps/rs/ibfs", any(control_endpoint))
        .fallback(serve_asset)
        .with_state(state);

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    handle
}

async fn control_endpoint(
    State(state): State<MockState>,
    RawQuery(query): RawQuery,
    body: Bytes,
) -> Response {
    let mut params: HashMap<String, String> = HashMap::new();
    if let Some(query) = &query {
        for (k, v) in url::form_urlencoded::parse(query.as_bytes()) {
            params.insert(k.into_owned(), v.into_owned());
        }
    }
    for (k, v) in url::form_urlencoded::parse(&body) {
        params.insert(k.into_owned(), v.into_owned());
    }

    let action = params.get("IBIRS_action").cloned().unwrap_or_default();
    if action != "signOn" && action != "signOff" {
        state
            .tokens_seen
            .lock()
            .unwrap()
            .push(params.get("IBIWF_SES_AUTH_TOKEN").cloned());
    }

    match action.as_str() {
        "signOn" => {
            state.sign_ons.fetch_add(1, Ordering::SeqCst);
            match &state.opts.token {
                Some(token) => xml(format!(
                    r#"<ibfsrpc returncode="10000"><properties><entry key="IBI_CSRF_Token_Value" value="{token}"/></properties></ibfsrpc>"#
                )),
                None => xml(
                    r#"<ibfsrpc returncode="10000"><properties><entry key="unrelated" value="x"/></properties></ibfsrpc>"#
                        .to_string(),
                ),
            }
        }
        "signOff" => {
            state.sign_offs.fetch_add(1, Ordering::SeqCst);
            xml(r#"<ibfsrpc returncode="10000"/>"#.to_string())
        }
        "list" => {
            let items: String = state
                .opts
                .listing
                .iter()
                .map(|(name, item_type)| {
                    format!(r#"<item name="{name}" type="{item_type}" createdOn="1700000000000"/>"#)
                })
                .collect();
            xml(format!(
                r#"<ibfsrpc returncode="10000"><rootObject>{items}</rootObject></ibfsrpc>"#
            ))
        }
        "run" => (
            [(header::CONTENT_TYPE, "text/html")],
            "<html>report output</html>",
        )
            .into_response(),
        "runDeferred" => {
            if state.opts.defer_return_code == "10000" {
                state.deferred.lock().unwrap().push("TICKET-1".to_string());
                xml(
                    r#"<ibfsrpc returncode="10000"><rootObject ticketName="TICKET-1" reportName="Report1.fex" createdOn="1700000000000" status="NOT_READY"/></ibfsrpc>"#
                        .to_string(),
                )
            } else {
                xml(format!(
                    r#"<ibfsrpc returncode="{}"><rootObject ticketName="MUST-NOT-APPEAR"/></ibfsrpc>"#,
                    state.opts.defer_return_code
                ))
            }
        }
        "listTickets" => {
            let tickets: String = state
                .deferred
                .lock()
                .unwrap()
                .iter()
                .map(|name| {
                    format!(
                        r#"<ticket ticketName="{name}" reportName="Report1.fex" createdOn="1700000000000" status="READY"/>"#
                    )
                })
                .collect();
            xml(format!(
                r#"<ibfsrpc returncode="10000"><rootObject>{tickets}</rootObject></ibfsrpc>"#
            ))
        }
        "getTicket" => {
            let name = params.get("IBIRS_ticketName").cloned().unwrap_or_default();
            xml(format!(
                r#"<ibfsrpc returncode="10000"><rootObject ticketName="{name}" status="READY"/></ibfsrpc>"#
            ))
        }
        "deleteTicket" => {
            let name = params.get("IBIRS_ticketName").cloned().unwrap_or_default();
            state.deferred.lock().unwrap().retain(|t| t != &name);
            xml(r#"<ibfsrpc returncode="10000"/>"#.to_string())
        }
        "listSchedules" => xml(
            r#"<ibfsrpc returncode="10000"><rootObject><schedule name="weekly" owner="admin" description="weekly sales"/></rootObject></ibfsrpc>"#
                .to_string(),
        ),
        "getSchedule" => {
            let name = params.get("IBIRS_path").cloned().unwrap_or_default();
            xml(format!(
                r#"<ibfsrpc returncode="10000"><rootObject name="{name}" owner="admin" sendMethod="EMAIL" destinationAddress="ops@example.com" lastTimeExecuted="1700000000000"><procedures><procedure name="p1"/><procedure name="p2"/></procedures></rootObject></ibfsrpc>"#
            ))
        }
        "getLog" => xml(
            r#"<ibfsrpc returncode="10000"><rootObject xmlns:ns1="urn:log"><ns1:entry><ns1:startTime>1700000000000</ns1:startTime><ns1:endTime>1700000100000</ns1:endTime><ns1:errorType>NONE</ns1:errorType><ns1:owner>admin</ns1:owner></ns1:entry></rootObject></ibfsrpc>"#
                .to_string(),
        ),
        _ => (StatusCode::BAD_REQUEST, "unknown action").into_response(),
    }
}

async fn serve_asset() -> Response {
    ([(header::CONTENT_TYPE, "image/png")], ASSET_BYTES).into_response()
}

fn xml(body: String) -> Response {
    ([(header::CONTENT_TYPE, "text/xml")], body).into_response()
}
