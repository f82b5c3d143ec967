/*!
 * Event Counts
 * Counters of assembled child events, shared by views and pending actions
 */

use crate::collection::RumEventType;
use crate::lifecycle::{LifeCycle, LifeCycleEvent, LifeCycleEventKind, Subscription};
use serde::Serialize;
use std::cell::Cell;
use std::rc::Rc;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EventCounts {
    pub error_count: u64,
    pub long_task_count: u64,
    pub resource_count: u64,
    pub action_count: u64,
}

/// Change callback
pub type CountsCallback = Rc<dyn Fn(EventCounts)>;

/// Counts assembled events from start until `stop`
pub struct EventCountsTracker {
    counts: Rc<Cell<EventCounts>>,
    subscription: Subscription,
}

impl EventCountsTracker {
    pub fn start(lifecycle: &LifeCycle, on_change: Option<CountsCallback>) -> Self {
        let counts = Rc::new(Cell::new(EventCounts::default()));
        let handler_counts = Rc::clone(&counts);

        let subscription = lifecycle.subscribe(LifeCycleEventKind::RumEventCollected, move |event| {
            let LifeCycleEvent::RumEventCollected(assembled) = event else {
                return;
            };

            let mut current = handler_counts.get();
            match assembled.event_type() {
                RumEventType::Error => current.error_count += 1,
                RumEventType::LongTask => current.long_task_count += 1,
                RumEventType::Resource => current.resource_count += 1,
                RumEventType::Action => current.action_count += 1,
                RumEventType::View => return,
            }
            handler_counts.set(current);

            if let Some(callback) = &on_change {
                callback(current);
            }
        });

        Self { counts, subscription }
    }

    pub fn counts(&self) -> EventCounts {
        self.counts.get()
    }

    pub fn stop(&self) {
        self.subscription.unsubscribe();
    }
}
