/*!
 * View Timings
 * Initial view milestones and cumulative layout shift
 */

use crate::lifecycle::{LifeCycle, LifeCycleEvent, LifeCycleEventKind, PerformanceEntry, Subscription};
use serde::Serialize;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

const FIRST_CONTENTFUL_PAINT: &str = "first-contentful-paint";

/// Milestones of the initial view, in ms relative to the time origin
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ViewTimings {
    pub first_byte: Option<f64>,
    pub dom_interactive: Option<f64>,
    pub dom_content_loaded: Option<f64>,
    pub dom_complete: Option<f64>,
    pub load_event: Option<f64>,
    pub first_contentful_paint: Option<f64>,
    pub largest_contentful_paint: Option<f64>,
    pub first_input_delay: Option<f64>,
    pub first_input_time: Option<f64>,
}

/// Timings callback, receiving the full snapshot after every change
pub type TimingsCallback = Rc<dyn Fn(ViewTimings)>;

/// Collects initial view timings from performance entries
///
/// Largest contentful paint stops updating once the first input is seen;
/// later candidates reflect content the user caused.
pub struct InitialViewTimingsTracker {
    subscription: Subscription,
}

impl InitialViewTimingsTracker {
    pub fn start(lifecycle: &LifeCycle, callback: TimingsCallback) -> Self {
        let timings = RefCell::new(ViewTimings::default());
        let input_seen = Cell::new(false);

        let subscription = lifecycle.subscribe(LifeCycleEventKind::PerformanceEntryCollected, move |event| {
            let LifeCycleEvent::PerformanceEntryCollected(entry) = event else {
                return;
            };

            let snapshot = {
                let mut timings = timings.borrow_mut();
                match entry {
                    PerformanceEntry::Navigation(navigation) => {
                        timings.first_byte = Some(navigation.response_start.millis());
                        timings.dom_interactive = Some(navigation.dom_interactive.millis());
                        timings.dom_content_loaded = Some(navigation.dom_content_loaded_event_end.millis());
                        timings.dom_complete = Some(navigation.dom_complete.millis());
                        timings.load_event = Some(navigation.load_event_end.millis());
                    }
                    PerformanceEntry::Paint(paint) if paint.name == FIRST_CONTENTFUL_PAINT => {
                        if timings.first_contentful_paint.is_some() {
                            return;
                        }
                        timings.first_contentful_paint = Some(paint.start_time.millis());
                    }
                    PerformanceEntry::LargestContentfulPaint(lcp) => {
                        if input_seen.get() {
                            return;
                        }
                        timings.largest_contentful_paint = Some(lcp.start_time.millis());
                    }
                    PerformanceEntry::FirstInput(input) => {
                        if input_seen.replace(true) {
                            return;
                        }
                        timings.first_input_delay = Some((input.processing_start - input.start_time).max(0.0));
                        timings.first_input_time = Some(input.start_time.millis());
                    }
                    _ => return,
                }
                timings.clone()
            };

            callback(snapshot);
        });

        Self { subscription }
    }

    pub fn stop(&self) {
        self.subscription.unsubscribe();
    }
}

/// Layout shift callback, receiving each counted shift value
pub type LayoutShiftCallback = Rc<dyn Fn(f64)>;

/// Start counting layout shifts not caused by recent input
pub fn track_layout_shift(lifecycle: &LifeCycle, callback: LayoutShiftCallback) -> Subscription {
    lifecycle.subscribe(LifeCycleEventKind::PerformanceEntryCollected, move |event| {
        if let LifeCycleEvent::PerformanceEntryCollected(PerformanceEntry::LayoutShift(shift)) = event {
            if !shift.had_recent_input {
                callback(shift.value);
            }
        }
    })
}
