//! XML envelope parsing for upstream responses.
//!
//! # Responsibilities
//! - Build a small element tree from raw response bytes
//! - Interpret the generic response envelope (`returncode` attribute,
//!   `rootObject` child)
//! - Project listing containers into name+attribute records
//! - Decode epoch-millisecond timestamps
//!
//! # Design Decisions
//! - Namespace prefixes are stripped during parsing, so log-query
//!   responses with namespaced tags match plain field names
//! - Success is `returncode == "10000"`; for any other code the
//!   payload is reported absent even if present in the raw XML
//! - Absent or unparseable timestamps yield `None`, never an error

use chrono::{DateTime, Local};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::upstream::error::{UpstreamError, UpstreamResult};

/// Return code the upstream uses to signal success.
pub const SUCCESS_CODE: &str = "10000";

/// One parsed XML element with namespace prefixes stripped.
#[derive(Debug, Clone, Default)]
pub struct Element {
    /// Local tag name (`{ns}startTime` and `ns:startTime` both become
    /// `startTime`).
    pub name: String,
    /// Attributes in document order.
    pub attributes: Vec<(String, String)>,
    /// Immediate children in document order.
    pub children: Vec<Element>,
    /// Concatenated text content of this element.
    pub text: String,
}

impl Element {
    /// Look up an attribute value by name.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Single-level lookup of the first child with the given local tag
    /// name.
    pub fn child(&self, tag: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.name == tag)
    }
}

/// Parse raw bytes into an element tree.
///
/// Fails with [`UpstreamError::MalformedResponse`] if the bytes are
/// not well-formed XML.
pub fn parse(bytes: &[u8]) -> UpstreamResult<Element> {
    let mut reader = Reader::from_reader(bytes);
    let mut stack: Vec<Element> = Vec::new();
    loop {
        match reader.read_event() {
            Ok(Event::Start(start)) => stack.push(element_from(&start)?),
            Ok(Event::Empty(start)) => {
                let element = element_from(&start)?;
                match stack.last_mut() {
                    Some(parent) => parent.children.push(element),
                    None => return Ok(element),
                }
            }
            Ok(Event::End(_)) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| malformed("unbalanced closing tag"))?;
                match stack.last_mut() {
                    Some(parent) => parent.children.push(element),
                    None => return Ok(element),
                }
            }
            Ok(Event::Text(text)) => {
                let text = text.xml_content().map_err(|e| malformed(&e.to_string()))?;
                if let Some(current) = stack.last_mut() {
                    current.text.push_str(&text);
                }
            }
            Ok(Event::Eof) => return Err(malformed("no root element")),
            Ok(_) => {}
            Err(e) => return Err(malformed(&e.to_string())),
        }
    }
}

fn element_from(start: &BytesStart<'_>) -> UpstreamResult<Element> {
    let name = String::from_utf8_lossy(start.local_name().as_ref()).into_owned();
    let mut attributes = Vec::new();
    for attribute in start.attributes() {
        let attribute = attribute.map_err(|e| malformed(&e.to_string()))?;
        let key = String::from_utf8_lossy(attribute.key.local_name().as_ref()).into_owned();
        let value = attribute
            .unescape_value()
            .map_err(|e| malformed(&e.to_string()))?
            .into_owned();
        attributes.push((key, value));
    }
    Ok(Element {
        name,
        attributes,
        children: Vec::new(),
        text: String::new(),
    })
}

fn malformed(detail: &str) -> UpstreamError {
    UpstreamError::MalformedResponse(detail.to_string())
}

/// The generic upstream response envelope.
#[derive(Debug, Clone)]
pub struct Envelope {
    /// Upstream's own success/failure code (5-digit string).
    pub return_code: String,
    /// Primary result element; absent unless the return code is
    /// [`SUCCESS_CODE`].
    pub root_object: Option<Element>,
}

impl Envelope {
    pub fn is_success(&self) -> bool {
        self.return_code == SUCCESS_CODE
    }

    /// Map a non-success envelope to [`UpstreamError::Business`].
    pub fn require_success(self) -> UpstreamResult<Envelope> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(UpstreamError::Business {
                code: self.return_code,
            })
        }
    }
}

/// Parse the response envelope out of raw bytes.
pub fn parse_envelope(bytes: &[u8]) -> UpstreamResult<Envelope> {
    let root = parse(bytes)?;
    let return_code = root.attr("returncode").unwrap_or("").to_string();
    let root_object = if return_code == SUCCESS_CODE {
        root.child("rootObject").cloned()
    } else {
        None
    };
    Ok(Envelope {
        return_code,
        root_object,
    })
}

/// One entry of a listing container.
#[derive(Debug, Clone)]
pub struct Item {
    /// The entry's `name` attribute (empty when the upstream omits it).
    pub name: String,
    /// All attributes in document order.
    pub attributes: Vec<(String, String)>,
}

impl Item {
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Project a container's immediate children into name+attribute
/// records, preserving upstream order.
pub fn list_items(container: &Element) -> Vec<Item> {
    container
        .children
        .iter()
        .map(|child| Item {
            name: child.attr("name").unwrap_or("").to_string(),
            attributes: child.attributes.clone(),
        })
        .collect()
}

/// Keep only items whose `type` attribute equals `file_type`.
///
/// Non-matching entries are dropped entirely; callers must not assume
/// the original cardinality is preserved.
pub fn filter_items(items: Vec<Item>, file_type: &str) -> Vec<Item> {
    items
        .into_iter()
        .filter(|item| item.attr("type") == Some(file_type))
        .collect()
}

/// Decode an epoch-millisecond string into local wall-clock time.
///
/// Absent or unparseable input yields `None`; callers treat that as
/// "not yet executed" rather than an error.
pub fn decode_timestamp(raw: Option<&str>) -> Option<DateTime<Local>> {
    let millis: i64 = raw?.trim().parse().ok()?;
    DateTime::from_timestamp_millis(millis).map(|utc| utc.with_timezone(&Local))
}
