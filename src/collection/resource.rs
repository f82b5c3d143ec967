/*!
 * Resource Collection
 * Raw resource events from completed requests and resource timing entries
 *
 * Requests are correlated with their timing entry when one matches
 * unambiguously; otherwise the request's own start and duration are used.
 * Timing entries of instrumented requests are skipped, their request already
 * reports them.
 */

use super::raw::{RawResourceEvent, RawRumEvent, RawRumEventCollected, ResourceDetails, ResourceKind, ResourcePayload};
use super::resource_utils::{
    compute_details, compute_duration, compute_resource_kind, compute_size, is_allowed_request_url, is_request_kind,
};
use crate::core::config::Configuration;
use crate::core::types::ServerDuration;
use crate::host::{PerformanceTimeline, SessionManager};
use crate::lifecycle::{
    LifeCycle, LifeCycleEvent, LifeCycleEventKind, PerformanceEntry, RequestCompleteEvent, RequestType,
    ResourceTiming, Subscription,
};
use crate::matcher::match_request_timing;
use crate::scheduler::Scheduler;
use std::rc::Rc;
use tracing::trace;
use uuid::Uuid;

pub fn start_resource_collection(
    lifecycle: &LifeCycle,
    scheduler: Rc<Scheduler>,
    config: Rc<Configuration>,
    session: Rc<dyn SessionManager>,
    timeline: Rc<dyn PerformanceTimeline>,
) -> Vec<Subscription> {
    let mut subscriptions = Vec::with_capacity(2);

    {
        let bus = lifecycle.clone();
        let scheduler = Rc::clone(&scheduler);
        let config = Rc::clone(&config);
        let session = Rc::clone(&session);
        subscriptions.push(lifecycle.subscribe(LifeCycleEventKind::RequestCompleted, move |event| {
            let LifeCycleEvent::RequestCompleted(request) = event else {
                return;
            };
            if !session.is_tracked_with_resource() || !is_allowed_request_url(&config, &request.url) {
                return;
            }
            let entries = timeline.resource_entries_by_name(&request.url);
            let collected = process_request(&scheduler, request, &entries);
            bus.notify(LifeCycleEvent::RawRumEventCollected(collected));
        }));
    }

    {
        let bus = lifecycle.clone();
        subscriptions.push(
            lifecycle.subscribe(LifeCycleEventKind::PerformanceEntryCollected, move |event| {
                let LifeCycleEvent::PerformanceEntryCollected(PerformanceEntry::Resource(timing)) = event else {
                    return;
                };
                if !session.is_tracked_with_resource()
                    || is_request_kind(timing)
                    || !is_allowed_request_url(&config, &timing.name)
                {
                    return;
                }
                bus.notify(LifeCycleEvent::RawRumEventCollected(process_resource_entry(&scheduler, timing)));
            }),
        );
    }

    subscriptions
}

fn process_request(
    scheduler: &Scheduler,
    request: &RequestCompleteEvent,
    entries: &[ResourceTiming],
) -> RawRumEventCollected {
    let kind = match request.request_type {
        RequestType::Xhr => ResourceKind::Xhr,
        RequestType::Fetch => ResourceKind::Fetch,
    };

    let matching = match_request_timing(request, entries);
    if matching.is_none() {
        trace!(url = %request.url, candidates = entries.len(), "no timing entry matched the request");
    }

    let start_time = matching.as_ref().map(|timing| timing.start_time).unwrap_or(request.start_time);
    let (duration, size, details) = match &matching {
        Some(timing) => (
            compute_duration(timing),
            compute_size(timing),
            compute_details(timing).unwrap_or_default(),
        ),
        None => (ServerDuration::from_millis(request.duration), None, ResourceDetails::default()),
    };

    let raw = RawResourceEvent {
        date: scheduler.clocks_at(start_time).time_stamp,
        resource: ResourcePayload {
            id: Uuid::new_v4().to_string(),
            kind,
            url: request.url.clone(),
            method: Some(request.method.clone()),
            status_code: Some(request.status),
            duration,
            size,
            details,
        },
    };
    RawRumEventCollected::new(start_time, RawRumEvent::Resource(raw))
}

fn process_resource_entry(scheduler: &Scheduler, timing: &ResourceTiming) -> RawRumEventCollected {
    let raw = RawResourceEvent {
        date: scheduler.clocks_at(timing.start_time).time_stamp,
        resource: ResourcePayload {
            id: Uuid::new_v4().to_string(),
            kind: compute_resource_kind(timing),
            url: timing.name.clone(),
            method: None,
            status_code: None,
            duration: compute_duration(timing),
            size: compute_size(timing),
            details: compute_details(timing).unwrap_or_default(),
        },
    };
    RawRumEventCollected::new(timing.start_time, RawRumEvent::Resource(raw))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{RelativeTime, TimeStamp};
    use crate::host::{ResourceTimingBuffer, StaticSession};
    use std::cell::RefCell;

    struct Fixture {
        lifecycle: LifeCycle,
        timeline: Rc<ResourceTimingBuffer>,
        collected: Rc<RefCell<Vec<RawRumEventCollected>>>,
        _subscriptions: Vec<Subscription>,
    }

    fn fixture(session: StaticSession) -> Fixture {
        let lifecycle = LifeCycle::new();
        let timeline = Rc::new(ResourceTimingBuffer::new());
        let subscriptions = start_resource_collection(
            &lifecycle,
            Scheduler::new(TimeStamp(1_000.0)),
            Rc::new(Configuration::new("app", "https://intake.example/v1/input")),
            Rc::new(session),
            Rc::clone(&timeline) as Rc<dyn PerformanceTimeline>,
        );

        let collected = Rc::new(RefCell::new(Vec::new()));
        let collected_clone = Rc::clone(&collected);
        lifecycle.subscribe(LifeCycleEventKind::RawRumEventCollected, move |event| {
            if let LifeCycleEvent::RawRumEventCollected(raw) = event {
                collected_clone.borrow_mut().push(raw.clone());
            }
        });

        Fixture {
            lifecycle,
            timeline,
            collected,
            _subscriptions: subscriptions,
        }
    }

    fn request(url: &str) -> RequestCompleteEvent {
        RequestCompleteEvent {
            request_index: 1,
            request_type: RequestType::Fetch,
            method: "POST".to_string(),
            url: url.to_string(),
            status: 201,
            start_time: RelativeTime(100.0),
            duration: 60.0,
        }
    }

    fn resource(collected: &RawRumEventCollected) -> &ResourcePayload {
        match &collected.raw {
            RawRumEvent::Resource(event) => &event.resource,
            other => panic!("expected a resource event, got {other:?}"),
        }
    }

    #[test]
    fn test_request_without_timing_uses_own_measures() {
        let fixture = fixture(StaticSession::tracked());
        fixture
            .lifecycle
            .notify(LifeCycleEvent::RequestCompleted(request("https://api.example/orders")));

        let collected = fixture.collected.borrow();
        assert_eq!(collected.len(), 1);
        assert_eq!(collected[0].start_time, RelativeTime(100.0));
        let payload = resource(&collected[0]);
        assert_eq!(payload.kind, ResourceKind::Fetch);
        assert_eq!(payload.duration, ServerDuration(60_000_000));
        assert_eq!(payload.status_code, Some(201));
        assert_eq!(payload.method.as_deref(), Some("POST"));
    }

    #[test]
    fn test_request_correlated_with_timing() {
        let fixture = fixture(StaticSession::tracked());
        let at = RelativeTime(110.0);
        fixture.timeline.record(ResourceTiming {
            name: "https://api.example/orders".to_string(),
            initiator_type: "fetch".to_string(),
            start_time: at,
            duration: 40.0,
            fetch_start: at,
            domain_lookup_start: at,
            domain_lookup_end: at,
            connect_start: at,
            connect_end: at,
            request_start: RelativeTime(115.0),
            response_start: RelativeTime(140.0),
            response_end: RelativeTime(150.0),
            decoded_body_size: Some(512),
            ..ResourceTiming::default()
        });
        fixture
            .lifecycle
            .notify(LifeCycleEvent::RequestCompleted(request("https://api.example/orders")));

        let collected = fixture.collected.borrow();
        assert_eq!(collected[0].start_time, RelativeTime(110.0));
        let payload = resource(&collected[0]);
        assert_eq!(payload.duration, ServerDuration(40_000_000));
        assert_eq!(payload.size, Some(512));
        assert!(payload.details.first_byte.is_some());
    }

    #[test]
    fn test_resource_entries() {
        let fixture = fixture(StaticSession::tracked());
        let entry = |name: &str, initiator: &str| {
            LifeCycleEvent::PerformanceEntryCollected(PerformanceEntry::Resource(ResourceTiming {
                name: name.to_string(),
                initiator_type: initiator.to_string(),
                start_time: RelativeTime(20.0),
                duration: 5.0,
                ..ResourceTiming::default()
            }))
        };

        fixture.lifecycle.notify(entry("https://cdn.example/app.js", "script"));
        fixture.lifecycle.notify(entry("https://api.example/orders", "fetch"));
        fixture.lifecycle.notify(entry("https://intake.example/v1/input?batch_time=5", "beacon"));
        fixture.lifecycle.notify(entry("data:image/gif;base64,R0lGOD", "img"));

        let collected = fixture.collected.borrow();
        assert_eq!(collected.len(), 1);
        let payload = resource(&collected[0]);
        assert_eq!(payload.kind, ResourceKind::Js);
        assert_eq!(payload.method, None);
    }

    #[test]
    fn test_session_without_resources() {
        let fixture = fixture(StaticSession::tracked_without_resources());
        fixture
            .lifecycle
            .notify(LifeCycleEvent::RequestCompleted(request("https://api.example/orders")));
        assert!(fixture.collected.borrow().is_empty());
    }
}
