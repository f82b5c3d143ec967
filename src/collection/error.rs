/*!
 * Error Collection
 * Errors reported through the public API
 */

use super::raw::{ErrorPayload, ErrorSource, RawErrorEvent, RawRumEvent, RawRumEventCollected};
use crate::core::types::{ClocksState, Context};
use crate::lifecycle::{LifeCycle, LifeCycleEvent};

/// Error added through the public API
#[derive(Debug, Clone, PartialEq)]
pub struct ProvidedError {
    pub message: String,
    pub source: ErrorSource,
    pub stack: Option<String>,
    pub error_type: Option<String>,
    pub start_clocks: ClocksState,
    pub context: Option<Context>,
    /// Global context at the time of the call
    pub saved_global_context: Context,
}

/// Collect an error
pub fn add_error(lifecycle: &LifeCycle, error: ProvidedError) {
    let raw = RawErrorEvent {
        date: error.start_clocks.time_stamp,
        error: ErrorPayload {
            message: error.message,
            source: error.source,
            stack: error.stack,
            error_type: error.error_type,
        },
    };
    lifecycle.notify(LifeCycleEvent::RawRumEventCollected(RawRumEventCollected {
        start_time: error.start_clocks.relative,
        raw: RawRumEvent::Error(raw),
        saved_global_context: Some(error.saved_global_context),
        customer_context: error.context,
    }));
}
