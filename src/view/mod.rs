/*!
 * View Module
 * View lifecycle, measures and the current-view tracker
 */

mod event_counts;
mod instance;
mod loading_time;
mod location;
mod timings;
mod tracker;

pub use event_counts::{CountsCallback, EventCounts, EventCountsTracker};
pub use instance::{View, ViewCreatedEvent, ViewEndedEvent, ViewEvent, ViewLoadingType};
pub use loading_time::LoadingTimeResolver;
pub use location::{are_different_location, ViewLocation};
pub use timings::{track_layout_shift, InitialViewTimingsTracker, ViewTimings};
pub use tracker::ViewTracker;
