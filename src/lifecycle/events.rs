/*!
 * Lifecycle Events
 * Closed set of (kind, payload) pairs flowing through the bus
 *
 * Instrumentation inputs (DOM mutations, performance entries, requests) enter
 * here; trackers, collections and the assembler exchange the remaining kinds.
 */

use crate::action::{ActionCreatedEvent, CompletedAction};
use crate::assembly::AssembledEvent;
use crate::collection::RawRumEventCollected;
use crate::core::types::RelativeTime;
use crate::view::{ViewCreatedEvent, ViewEndedEvent, ViewEvent};
use serde::{Deserialize, Serialize};

/// Event kind, the partition key of the bus
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LifeCycleEventKind {
    DomMutated,
    PerformanceEntryCollected,
    RequestStarted,
    RequestCompleted,
    ViewCreated,
    ViewUpdated,
    ViewEnded,
    AutoActionCreated,
    AutoActionCompleted,
    AutoActionDiscarded,
    RawRumEventCollected,
    RumEventCollected,
    SessionRenewed,
    BeforeUnload,
}

/// Every event carried by the bus
#[derive(Debug, Clone)]
pub enum LifeCycleEvent {
    DomMutated,
    PerformanceEntryCollected(PerformanceEntry),
    RequestStarted(RequestStartEvent),
    RequestCompleted(RequestCompleteEvent),
    ViewCreated(ViewCreatedEvent),
    ViewUpdated(ViewEvent),
    ViewEnded(ViewEndedEvent),
    AutoActionCreated(ActionCreatedEvent),
    AutoActionCompleted(CompletedAction),
    AutoActionDiscarded,
    RawRumEventCollected(RawRumEventCollected),
    RumEventCollected(AssembledEvent),
    SessionRenewed,
    BeforeUnload,
}

impl LifeCycleEvent {
    /// Kind of this event
    pub fn kind(&self) -> LifeCycleEventKind {
        match self {
            Self::DomMutated => LifeCycleEventKind::DomMutated,
            Self::PerformanceEntryCollected(_) => LifeCycleEventKind::PerformanceEntryCollected,
            Self::RequestStarted(_) => LifeCycleEventKind::RequestStarted,
            Self::RequestCompleted(_) => LifeCycleEventKind::RequestCompleted,
            Self::ViewCreated(_) => LifeCycleEventKind::ViewCreated,
            Self::ViewUpdated(_) => LifeCycleEventKind::ViewUpdated,
            Self::ViewEnded(_) => LifeCycleEventKind::ViewEnded,
            Self::AutoActionCreated(_) => LifeCycleEventKind::AutoActionCreated,
            Self::AutoActionCompleted(_) => LifeCycleEventKind::AutoActionCompleted,
            Self::AutoActionDiscarded => LifeCycleEventKind::AutoActionDiscarded,
            Self::RawRumEventCollected(_) => LifeCycleEventKind::RawRumEventCollected,
            Self::RumEventCollected(_) => LifeCycleEventKind::RumEventCollected,
            Self::SessionRenewed => LifeCycleEventKind::SessionRenewed,
            Self::BeforeUnload => LifeCycleEventKind::BeforeUnload,
        }
    }
}

// ============================================================================
// Instrumentation payloads
// ============================================================================

/// Performance timeline entry, one variant per entry type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "entry_type", rename_all = "kebab-case")]
pub enum PerformanceEntry {
    Resource(ResourceTiming),
    Navigation(NavigationTiming),
    Paint(PaintTiming),
    Longtask(LongTaskTiming),
    LargestContentfulPaint(LargestContentfulPaintTiming),
    FirstInput(FirstInputTiming),
    LayoutShift(LayoutShiftTiming),
}

/// Resource timing entry
///
/// Phase timestamps are relative to the time origin; zero means "not measured".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceTiming {
    /// Resource URL
    pub name: String,
    pub initiator_type: String,
    pub start_time: RelativeTime,
    pub duration: f64,
    pub fetch_start: RelativeTime,
    pub domain_lookup_start: RelativeTime,
    pub domain_lookup_end: RelativeTime,
    pub connect_start: RelativeTime,
    pub secure_connection_start: RelativeTime,
    pub connect_end: RelativeTime,
    pub request_start: RelativeTime,
    pub response_start: RelativeTime,
    pub response_end: RelativeTime,
    pub redirect_start: RelativeTime,
    pub redirect_end: RelativeTime,
    pub decoded_body_size: Option<u64>,
}

impl ResourceTiming {
    /// End of the entry's interval
    #[inline]
    pub fn end_time(&self) -> RelativeTime {
        self.start_time + self.duration
    }
}

/// Navigation timing of the initial document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavigationTiming {
    pub response_start: RelativeTime,
    pub dom_interactive: RelativeTime,
    pub dom_content_loaded_event_end: RelativeTime,
    pub dom_complete: RelativeTime,
    pub load_event_end: RelativeTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaintTiming {
    /// `first-paint` or `first-contentful-paint`
    pub name: String,
    pub start_time: RelativeTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LongTaskTiming {
    pub start_time: RelativeTime,
    pub duration: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LargestContentfulPaintTiming {
    pub start_time: RelativeTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FirstInputTiming {
    pub start_time: RelativeTime,
    pub processing_start: RelativeTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutShiftTiming {
    pub start_time: RelativeTime,
    pub value: f64,
    #[serde(default)]
    pub had_recent_input: bool,
}

/// Network call started
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestStartEvent {
    pub request_index: u64,
}

/// Instrumented API used for a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestType {
    Xhr,
    Fetch,
}

/// Network call completed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestCompleteEvent {
    pub request_index: u64,
    #[serde(rename = "type")]
    pub request_type: RequestType,
    pub method: String,
    pub url: String,
    pub status: u16,
    pub start_time: RelativeTime,
    pub duration: f64,
}
