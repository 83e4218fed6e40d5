//! Value objects reconstructed from upstream XML.
//!
//! Nothing here is cached: the upstream server is the sole source of
//! truth and every object is rebuilt fresh on each query. All
//! attributes the upstream does not explicitly guarantee are modeled
//! as `Option`.

use chrono::{DateTime, Local};

use crate::upstream::error::{UpstreamError, UpstreamResult};
use crate::upstream::xml::{self, Element, Item};

/// One entry of a repository folder listing.
#[derive(Debug, Clone)]
pub struct RepositoryItem {
    pub name: String,
    pub item_type: Option<String>,
    pub description: Option<String>,
    pub created_at: Option<DateTime<Local>>,
}

impl RepositoryItem {
    pub fn from_item(item: &Item) -> Self {
        Self {
            name: item.name.clone(),
            item_type: item.attr("type").map(str::to_string),
            description: item.attr("description").map(str::to_string),
            created_at: xml::decode_timestamp(item.attr("createdOn")),
        }
    }
}

/// Readiness of a deferred report run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TicketStatus {
    Ready,
    NotReady,
}

impl TicketStatus {
    fn from_attr(value: Option<&str>) -> Self {
        match value {
            Some("READY") => TicketStatus::Ready,
            _ => TicketStatus::NotReady,
        }
    }

    pub fn is_ready(self) -> bool {
        self == TicketStatus::Ready
    }
}

/// Handle for an asynchronously queued report execution.
#[derive(Debug, Clone)]
pub struct DeferredTicket {
    /// Unique per issuance; the only attribute the upstream guarantees.
    pub ticket_name: String,
    pub report_name: Option<String>,
    pub description: Option<String>,
    pub created_at: Option<DateTime<Local>>,
    pub status: TicketStatus,
}

impl DeferredTicket {
    pub fn from_element(element: &Element) -> UpstreamResult<Self> {
        let ticket_name = element
            .attr("ticketName")
            .ok_or_else(|| {
                UpstreamError::MalformedResponse("ticket descriptor missing ticketName".to_string())
            })?
            .to_string();
        Ok(Self {
            ticket_name,
            report_name: element.attr("reportName").map(str::to_string),
            description: element.attr("description").map(str::to_string),
            created_at: xml::decode_timestamp(element.attr("createdOn")),
            status: TicketStatus::from_attr(element.attr("status")),
        })
    }
}

/// A schedule definition stored in the upstream repository.
#[derive(Debug, Clone)]
pub struct ScheduleSummary {
    pub name: String,
    pub owner: Option<String>,
    pub description: Option<String>,
    pub send_method: Option<String>,
    pub destination_address: Option<String>,
    /// Absent until the schedule has run at least once.
    pub last_executed_at: Option<DateTime<Local>>,
    /// Absent for one-off schedules that already fired.
    pub next_run_at: Option<DateTime<Local>>,
    /// Ordered procedure names, as stored upstream.
    pub procedures: Vec<String>,
}

impl ScheduleSummary {
    pub fn from_element(element: &Element) -> Self {
        let procedures = element
            .child("procedures")
            .map(|container| {
                container
                    .children
                    .iter()
                    .filter_map(|p| p.attr("name").map(str::to_string))
                    .collect()
            })
            .unwrap_or_default();
        Self {
            name: element.attr("name").unwrap_or("").to_string(),
            owner: element.attr("owner").map(str::to_string),
            description: element.attr("description").map(str::to_string),
            send_method: element.attr("sendMethod").map(str::to_string),
            destination_address: element.attr("destinationAddress").map(str::to_string),
            last_executed_at: xml::decode_timestamp(element.attr("lastTimeExecuted")),
            next_run_at: xml::decode_timestamp(element.attr("nextRunTime")),
            procedures,
        }
    }
}

/// One row of a schedule execution log.
///
/// Log responses use namespaced tags; the parser strips prefixes, so
/// lookups here use plain field names.
#[derive(Debug, Clone)]
pub struct LogEntry {
    pub started_at: Option<DateTime<Local>>,
    pub ended_at: Option<DateTime<Local>>,
    pub error_type: Option<String>,
    pub owner: Option<String>,
}

impl LogEntry {
    pub fn from_element(element: &Element) -> Self {
        Self {
            started_at: xml::decode_timestamp(child_text(element, "startTime").as_deref()),
            ended_at: xml::decode_timestamp(child_text(element, "endTime").as_deref()),
            error_type: child_text(element, "errorType"),
            owner: child_text(element, "owner"),
        }
    }
}

fn child_text(element: &Element, tag: &str) -> Option<String> {
    element
        .child(tag)
        .map(|c| c.text.trim().to_string())
        .filter(|t| !t.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ticket_requires_a_name() {
        let element = xml::parse(br#"<rootObject description="nightly"/>"#).unwrap();
        assert!(DeferredTicket::from_element(&element).is_err());
    }

    #[test]
    fn ticket_optional_fields_default() {
        let element = xml::parse(br#"<rootObject ticketName="t-42"/>"#).unwrap();
        let ticket = DeferredTicket::from_element(&element).unwrap();
        assert_eq!(ticket.ticket_name, "t-42");
        assert!(ticket.report_name.is_none());
        assert!(ticket.created_at.is_none());
        assert_eq!(ticket.status, TicketStatus::NotReady);
    }

    #[test]
    fn schedule_tolerates_missing_run_times() {
        let element = xml::parse(
            br#"<rootObject name="weekly" owner="admin" sendMethod="EMAIL">
                <procedures><procedure name="p1"/><procedure name="p2"/></procedures>
            </rootObject>"#,
        )
        .unwrap();
        let schedule = ScheduleSummary::from_element(&element);
        assert_eq!(schedule.name, "weekly");
        assert!(schedule.last_executed_at.is_none());
        assert!(schedule.next_run_at.is_none());
        assert_eq!(schedule.procedures, ["p1", "p2"]);
    }

    #[test]
    fn log_entry_reads_namespaced_fields() {
        let element = xml::parse(
            br#"<ns:entry xmlns:ns="urn:log">
                <ns:startTime>1700000000000</ns:startTime>
                <ns:errorType>NONE</ns:errorType>
            </ns:entry>"#,
        )
        .unwrap();
        let entry = LogEntry::from_element(&element);
        assert!(entry.started_at.is_some());
        assert!(entry.ended_at.is_none());
        assert_eq!(entry.error_type.as_deref(), Some("NONE"));
        assert!(entry.owner.is_none());
    }
}
