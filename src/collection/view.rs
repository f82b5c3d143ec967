/*!
 * View Collection
 * Turns view updates into raw view events
 */

use super::raw::{RawRumEvent, RawRumEventCollected, RawViewEvent, ViewMeasures};
use crate::core::types::ServerDuration;
use crate::lifecycle::{LifeCycle, LifeCycleEvent, LifeCycleEventKind, Subscription};
use crate::view::ViewEvent;

pub fn start_view_collection(lifecycle: &LifeCycle) -> Subscription {
    let bus = lifecycle.clone();
    lifecycle.subscribe(LifeCycleEventKind::ViewUpdated, move |event| {
        if let LifeCycleEvent::ViewUpdated(view) = event {
            bus.notify(LifeCycleEvent::RawRumEventCollected(process_view_update(view)));
        }
    })
}

fn process_view_update(view: &ViewEvent) -> RawRumEventCollected {
    let to_ns = |value: Option<f64>| value.map(ServerDuration::from_millis);
    let timings = &view.timings;
    let counts = &view.event_counts;

    let raw = RawViewEvent {
        date: view.start_clocks.time_stamp,
        document_version: view.document_version,
        view: ViewMeasures {
            loading_type: view.loading_type,
            first_byte: to_ns(timings.first_byte),
            dom_interactive: to_ns(timings.dom_interactive),
            dom_content_loaded: to_ns(timings.dom_content_loaded),
            dom_complete: to_ns(timings.dom_complete),
            load_event: to_ns(timings.load_event),
            first_contentful_paint: to_ns(timings.first_contentful_paint),
            largest_contentful_paint: to_ns(timings.largest_contentful_paint),
            first_input_delay: to_ns(timings.first_input_delay),
            first_input_time: to_ns(timings.first_input_time),
            cumulative_layout_shift: view.cumulative_layout_shift,
            loading_time: to_ns(view.loading_time),
            time_spent: ServerDuration::from_millis(view.duration),
            is_active: view.is_active,
            error: counts.error_count.into(),
            action: counts.action_count.into(),
            long_task: counts.long_task_count.into(),
            resource: counts.resource_count.into(),
        },
    };

    RawRumEventCollected::new(view.start_clocks.relative, RawRumEvent::View(raw))
}
