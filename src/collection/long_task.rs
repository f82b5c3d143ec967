/*!
 * Long Task Collection
 */

use super::raw::{LongTaskPayload, RawLongTaskEvent, RawRumEvent, RawRumEventCollected};
use crate::core::types::ServerDuration;
use crate::lifecycle::{LifeCycle, LifeCycleEvent, LifeCycleEventKind, PerformanceEntry, Subscription};
use crate::scheduler::Scheduler;
use std::rc::Rc;

pub fn start_long_task_collection(lifecycle: &LifeCycle, scheduler: Rc<Scheduler>) -> Subscription {
    let bus = lifecycle.clone();
    lifecycle.subscribe(LifeCycleEventKind::PerformanceEntryCollected, move |event| {
        let LifeCycleEvent::PerformanceEntryCollected(PerformanceEntry::Longtask(task)) = event else {
            return;
        };
        let raw = RawLongTaskEvent {
            date: scheduler.clocks_at(task.start_time).time_stamp,
            long_task: LongTaskPayload {
                duration: ServerDuration::from_millis(task.duration),
            },
        };
        bus.notify(LifeCycleEvent::RawRumEventCollected(RawRumEventCollected::new(
            task.start_time,
            RawRumEvent::LongTask(raw),
        )));
    })
}
