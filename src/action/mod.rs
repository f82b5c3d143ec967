/*!
 * Action Module
 * User action detection, naming and resolution
 */

mod name;
mod tracker;

pub use name::{action_name, ElementSnapshot};
pub use tracker::{ActionCounts, ActionCreatedEvent, ActionTracker, ActionType, CompletedAction};
