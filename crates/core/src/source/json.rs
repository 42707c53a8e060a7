use careerline_protocol::{TimelineDocument, TimelineEvent};
use serde_json::Value;

use super::SourceError;

/// A decoded timeline file.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// The detail endpoint's shape: summary fields plus `nodes`.
    Document(TimelineDocument),
    /// A bare node array, as the node list endpoint returns it.
    Nodes(Vec<TimelineEvent>),
}

impl Payload {
    pub fn into_events(self) -> Vec<TimelineEvent> {
        match self {
            Self::Document(doc) => doc.nodes,
            Self::Nodes(nodes) => nodes,
        }
    }
}

pub fn parse_document(data: &[u8]) -> Result<TimelineDocument, SourceError> {
    Ok(serde_json::from_slice(data)?)
}

/// Detect the payload shape and decode it.
///
/// An array is a node list; an object with a `nodes` key is a timeline
/// document. Anything else is rejected.
pub fn parse_payload(data: &[u8]) -> Result<Payload, SourceError> {
    let value: Value = serde_json::from_slice(data)?;
    match &value {
        Value::Array(_) => Ok(Payload::Nodes(serde_json::from_value(value)?)),
        Value::Object(obj) if obj.contains_key("nodes") => {
            Ok(Payload::Document(serde_json::from_value(value)?))
        }
        _ => Err(SourceError::UnknownShape),
    }
}
