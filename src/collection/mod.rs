/*!
 * Collections
 * Turn lifecycle events and public API calls into raw RUM events
 */

mod action;
mod error;
mod long_task;
mod raw;
mod resource;
pub mod resource_utils;
mod view;

pub use action::{add_custom_action, start_action_collection, CustomAction};
pub use error::{add_error, ProvidedError};
pub use long_task::start_long_task_collection;
pub use raw::{
    ActionPayload, ActionTarget, Count, ErrorPayload, ErrorSource, LongTaskPayload, PhaseTiming, RawActionEvent,
    RawErrorEvent, RawLongTaskEvent, RawResourceEvent, RawRumEvent, RawRumEventCollected, RawViewEvent,
    ResourceDetails, ResourceKind, ResourcePayload, RumEventType, ViewMeasures,
};
pub use resource::start_resource_collection;
pub use view::start_view_collection;
