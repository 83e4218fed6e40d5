//! Typed helpers over the generic call primitive.
//!
//! Each helper sends one upstream action and interprets its envelope.
//! This replaces the one-near-duplicate-method-per-action pattern:
//! everything funnels through [`UpstreamSession::call`] so the token
//! and timeout behavior cannot drift between actions.

use reqwest::Method;

use crate::upstream::error::{UpstreamError, UpstreamResult};
use crate::upstream::session::UpstreamSession;
use crate::upstream::types::{DeferredTicket, LogEntry, RepositoryItem, ScheduleSummary};
use crate::upstream::xml;

const ACTION_FIELD: &str = "IBIRS_action";
const PATH_FIELD: &str = "IBIRS_path";
const TICKET_FIELD: &str = "IBIRS_ticketName";

fn pairs(fields: &[(&str, &str)]) -> Vec<(String, String)> {
    fields
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

impl UpstreamSession {
    /// List a repository folder, optionally keeping only entries of
    /// one file type (e.g. `FexFile`). Non-matching entries are
    /// dropped, not hidden.
    pub async fn list_repository(
        &self,
        folder: &str,
        file_type: Option<&str>,
    ) -> UpstreamResult<Vec<RepositoryItem>> {
        let query = pairs(&[(ACTION_FIELD, "list"), (PATH_FIELD, folder)]);
        let response = self
            .call(Method::GET, &self.config().control_path(), &query, None)
            .await?;
        let envelope = xml::parse_envelope(&response.body)?.require_success()?;

        let items = envelope
            .root_object
            .as_ref()
            .map(xml::list_items)
            .unwrap_or_default();
        let items = match file_type {
            Some(file_type) => xml::filter_items(items, file_type),
            None => items,
        };
        Ok(items.iter().map(RepositoryItem::from_item).collect())
    }

    /// Run a report and hand back the raw response for streaming to
    /// the browser (renders may be HTML, PDF, or images).
    pub async fn run_report(&self, report_path: &str) -> UpstreamResult<reqwest::Response> {
        let form = pairs(&[(ACTION_FIELD, "run"), (PATH_FIELD, report_path)]);
        self.call_streaming(Method::POST, &self.config().control_path(), &[], Some(&form))
            .await
    }

    /// Queue a deferred run of a report. The envelope's root object is
    /// the issued ticket descriptor.
    pub async fn defer_report(
        &self,
        report_path: &str,
        description: &str,
    ) -> UpstreamResult<DeferredTicket> {
        let form = pairs(&[
            (ACTION_FIELD, "runDeferred"),
            (PATH_FIELD, report_path),
            ("IBIRS_description", description),
        ]);
        let response = self
            .call(Method::POST, &self.config().control_path(), &[], Some(&form))
            .await?;
        let envelope = xml::parse_envelope(&response.body)?.require_success()?;
        let root = envelope.root_object.ok_or_else(missing_root)?;
        DeferredTicket::from_element(&root)
    }

    /// List the caller's deferred tickets.
    pub async fn list_tickets(&self) -> UpstreamResult<Vec<DeferredTicket>> {
        let query = pairs(&[(ACTION_FIELD, "listTickets")]);
        let response = self
            .call(Method::GET, &self.config().control_path(), &query, None)
            .await?;
        let envelope = xml::parse_envelope(&response.body)?.require_success()?;
        let root = envelope.root_object.ok_or_else(missing_root)?;
        root.children
            .iter()
            .map(DeferredTicket::from_element)
            .collect()
    }

    /// Query a single ticket's current state.
    pub async fn ticket_status(&self, ticket_name: &str) -> UpstreamResult<DeferredTicket> {
        let query = pairs(&[(ACTION_FIELD, "getTicket"), (TICKET_FIELD, ticket_name)]);
        let response = self
            .call(Method::GET, &self.config().control_path(), &query, None)
            .await?;
        let envelope = xml::parse_envelope(&response.body)?.require_success()?;
        let root = envelope.root_object.ok_or_else(missing_root)?;
        DeferredTicket::from_element(&root)
    }

    /// Delete a deferred ticket.
    pub async fn delete_ticket(&self, ticket_name: &str) -> UpstreamResult<()> {
        let form = pairs(&[(ACTION_FIELD, "deleteTicket"), (TICKET_FIELD, ticket_name)]);
        let response = self
            .call(Method::POST, &self.config().control_path(), &[], Some(&form))
            .await?;
        xml::parse_envelope(&response.body)?.require_success()?;
        Ok(())
    }

    /// List stored schedules.
    pub async fn list_schedules(&self) -> UpstreamResult<Vec<ScheduleSummary>> {
        let query = pairs(&[(ACTION_FIELD, "listSchedules")]);
        let response = self
            .call(Method::GET, &self.config().control_path(), &query, None)
            .await?;
        let envelope = xml::parse_envelope(&response.body)?.require_success()?;
        let root = envelope.root_object.ok_or_else(missing_root)?;
        Ok(root.children.iter().map(ScheduleSummary::from_element).collect())
    }

    /// Fetch one schedule's full description.
    pub async fn get_schedule(&self, schedule_path: &str) -> UpstreamResult<ScheduleSummary> {
        let query = pairs(&[(ACTION_FIELD, "getSchedule"), (PATH_FIELD, schedule_path)]);
        let response = self
            .call(Method::GET, &self.config().control_path(), &query, None)
            .await?;
        let envelope = xml::parse_envelope(&response.body)?.require_success()?;
        let root = envelope.root_object.ok_or_else(missing_root)?;
        Ok(ScheduleSummary::from_element(&root))
    }

    /// Fetch the execution log of one schedule. Rows arrive with
    /// namespaced tags; the parser already stripped the prefixes.
    pub async fn schedule_log(&self, schedule_path: &str) -> UpstreamResult<Vec<LogEntry>> {
        let query = pairs(&[(ACTION_FIELD, "getLog"), (PATH_FIELD, schedule_path)]);
        let response = self
            .call(Method::GET, &self.config().control_path(), &query, None)
            .await?;
        let envelope = xml::parse_envelope(&response.body)?.require_success()?;
        let root = envelope.root_object.ok_or_else(missing_root)?;
        Ok(root.children.iter().map(LogEntry::from_element).collect())
    }

    /// Fetch an arbitrary upstream path (static assets, web UI
    /// resources) for byte-for-byte forwarding.
    pub async fn fetch_asset(&self, asset_path: &str) -> UpstreamResult<reqwest::Response> {
        self.call_streaming(Method::GET, asset_path, &[], None).await
    }
}

fn missing_root() -> UpstreamError {
    UpstreamError::MalformedResponse("success envelope missing rootObject".to_string())
}
