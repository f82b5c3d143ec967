/*!
 * RUM Pipeline Library
 * Browser telemetry pipeline: views, actions, resources and errors
 * assembled into bounded batches
 */

pub mod action;
pub mod activity;
pub mod assembly;
pub mod collection;
pub mod core;
pub mod host;
pub mod lifecycle;
pub mod matcher;
pub mod pipeline;
pub mod scheduler;
pub mod transport;
pub mod view;

// Re-exports
pub use action::{ActionTracker, ElementSnapshot};
pub use activity::{ActivityMonitor, PageActivityTracker};
pub use assembly::{to_wire, AssembledEvent, GlobalContext, ParentContexts, WireFormat};
pub use collection::{ErrorSource, RawRumEvent, RumEventType};
pub use crate::core::*;
pub use host::{HostEnvironment, PerformanceTimeline, ResourceTimingBuffer, SessionManager, StaticEnvironment, StaticSession};
pub use lifecycle::{LifeCycle, LifeCycleEvent, LifeCycleEventKind, PerformanceEntry, Subscription};
pub use matcher::match_request_timing;
pub use pipeline::{PageStart, PipelineHost, RumPipeline};
pub use scheduler::{Scheduler, Throttle, TimerId};
pub use transport::{RecordingSender, ReqwestSender, RequestSender, RumBatch};
pub use view::{ViewLocation, ViewTracker};
