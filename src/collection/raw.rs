/*!
 * Raw RUM Events
 * Typed payloads produced by the collections, before context assembly
 *
 * Field names are the wire names; optional measures are omitted when unset.
 */

use crate::action::ActionType;
use crate::core::types::{ActionId, Context, RelativeTime, ServerDuration, TimeStamp};
use crate::view::ViewLoadingType;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RumEventType {
    View,
    Action,
    Resource,
    Error,
    LongTask,
}

impl RumEventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::View => "view",
            Self::Action => "action",
            Self::Resource => "resource",
            Self::Error => "error",
            Self::LongTask => "long_task",
        }
    }

    /// Whether events of this type take the action active at their start
    #[inline]
    pub fn assembles_with_action(&self) -> bool {
        matches!(self, Self::Error | Self::Resource | Self::LongTask)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Count {
    pub count: u64,
}

impl From<u64> for Count {
    fn from(count: u64) -> Self {
        Self { count }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RawViewEvent {
    pub date: TimeStamp,
    #[serde(skip)]
    pub document_version: u64,
    pub view: ViewMeasures,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewMeasures {
    pub loading_type: ViewLoadingType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_byte: Option<ServerDuration>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dom_interactive: Option<ServerDuration>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dom_content_loaded: Option<ServerDuration>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dom_complete: Option<ServerDuration>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub load_event: Option<ServerDuration>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_contentful_paint: Option<ServerDuration>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub largest_contentful_paint: Option<ServerDuration>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_input_delay: Option<ServerDuration>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_input_time: Option<ServerDuration>,
    pub cumulative_layout_shift: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub loading_time: Option<ServerDuration>,
    pub time_spent: ServerDuration,
    pub is_active: bool,
    pub error: Count,
    pub action: Count,
    pub long_task: Count,
    pub resource: Count,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RawActionEvent {
    pub date: TimeStamp,
    pub action: ActionPayload,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<ActionId>,
    #[serde(rename = "type")]
    pub action_type: ActionType,
    pub target: ActionTarget,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub loading_time: Option<ServerDuration>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<Count>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub long_task: Option<Count>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource: Option<Count>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionTarget {
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Document,
    Xhr,
    Beacon,
    Fetch,
    Css,
    Js,
    Image,
    Font,
    Media,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PhaseTiming {
    pub duration: ServerDuration,
    pub start: ServerDuration,
}

/// Per-phase breakdown of a resource fetch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ResourceDetails {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect: Option<PhaseTiming>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dns: Option<PhaseTiming>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connect: Option<PhaseTiming>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ssl: Option<PhaseTiming>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_byte: Option<PhaseTiming>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub download: Option<PhaseTiming>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RawResourceEvent {
    pub date: TimeStamp,
    pub resource: ResourcePayload,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResourcePayload {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: ResourceKind,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    pub duration: ServerDuration,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(flatten)]
    pub details: ResourceDetails,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorSource {
    Agent,
    Console,
    Custom,
    Logger,
    Network,
    Source,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RawErrorEvent {
    pub date: TimeStamp,
    pub error: ErrorPayload,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorPayload {
    pub message: String,
    pub source: ErrorSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub error_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RawLongTaskEvent {
    pub date: TimeStamp,
    pub long_task: LongTaskPayload,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LongTaskPayload {
    pub duration: ServerDuration,
}

/// Raw event of any type
#[derive(Debug, Clone, PartialEq)]
pub enum RawRumEvent {
    View(RawViewEvent),
    Action(RawActionEvent),
    Resource(RawResourceEvent),
    Error(RawErrorEvent),
    LongTask(RawLongTaskEvent),
}

impl RawRumEvent {
    pub fn event_type(&self) -> RumEventType {
        match self {
            Self::View(_) => RumEventType::View,
            Self::Action(_) => RumEventType::Action,
            Self::Resource(_) => RumEventType::Resource,
            Self::Error(_) => RumEventType::Error,
            Self::LongTask(_) => RumEventType::LongTask,
        }
    }

    pub fn date(&self) -> TimeStamp {
        match self {
            Self::View(event) => event.date,
            Self::Action(event) => event.date,
            Self::Resource(event) => event.date,
            Self::Error(event) => event.date,
            Self::LongTask(event) => event.date,
        }
    }
}

/// Payload of `RawRumEventCollected`
#[derive(Debug, Clone, PartialEq)]
pub struct RawRumEventCollected {
    /// Time used to find the parent view and action
    pub start_time: RelativeTime,
    pub raw: RawRumEvent,
    /// Global context captured when a custom event was added
    pub saved_global_context: Option<Context>,
    pub customer_context: Option<Context>,
}

impl RawRumEventCollected {
    pub fn new(start_time: RelativeTime, raw: RawRumEvent) -> Self {
        Self {
            start_time,
            raw,
            saved_global_context: None,
            customer_context: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_event_types() {
        assert!(RumEventType::Error.assembles_with_action());
        assert!(RumEventType::LongTask.assembles_with_action());
        assert!(!RumEventType::View.assembles_with_action());
        assert!(!RumEventType::Action.assembles_with_action());
        assert_eq!(RumEventType::LongTask.as_str(), "long_task");
    }

    #[test]
    fn test_resource_payload_shape() {
        let payload = ResourcePayload {
            id: "r1".to_string(),
            kind: ResourceKind::Fetch,
            url: "https://api.example/items".to_string(),
            method: Some("GET".to_string()),
            status_code: Some(200),
            duration: ServerDuration(5_000_000),
            size: None,
            details: ResourceDetails {
                first_byte: Some(PhaseTiming {
                    duration: ServerDuration(1_000_000),
                    start: ServerDuration(0),
                }),
                ..ResourceDetails::default()
            },
        };

        assert_eq!(
            serde_json::to_value(&payload).unwrap(),
            json!({
                "id": "r1",
                "type": "fetch",
                "url": "https://api.example/items",
                "method": "GET",
                "status_code": 200,
                "duration": 5_000_000,
                "first_byte": {"duration": 1_000_000, "start": 0},
            })
        );
    }
}
