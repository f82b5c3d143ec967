/*!
 * Activity Module
 * Busy/idle signal derivation and idle-settle detection
 */

mod monitor;
mod signals;

pub use monitor::{ActivityCompletion, ActivityMonitor, CompletionCallback};
pub use signals::{ActivitySignal, PageActivityTracker, SignalSink};
