/*!
 * Scheduler Module
 * Virtual-time event loop and timer utilities
 */

mod throttle;
mod timer;

pub use throttle::Throttle;
pub use timer::{Scheduler, TimerId};
