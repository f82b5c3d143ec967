/*!
 * View
 * State machine of one page or route instance
 *
 * A view is ACTIVE from creation until `end()`, then ENDED. Ending freezes the
 * duration and stops event counting, activity and layout shift tracking, but
 * late timings are still accepted and emitted.
 *
 * Updates go through a trailing-edge throttle; the creation update and forced
 * updates (`trigger_update`) are immediate and cancel any pending one.
 */

use super::event_counts::{EventCounts, EventCountsTracker};
use super::loading_time::LoadingTimeResolver;
use super::location::{are_different_location, ViewLocation};
use super::timings::{track_layout_shift, ViewTimings};
use crate::activity::ActivityMonitor;
use crate::core::config::Configuration;
use crate::core::types::{ClocksState, RelativeTime, ViewId};
use crate::host::HostEnvironment;
use crate::lifecycle::{LifeCycle, LifeCycleEvent, Subscription};
use crate::scheduler::{Scheduler, Throttle};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::rc::{Rc, Weak};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewLoadingType {
    InitialLoad,
    RouteChange,
}

/// Payload of `ViewCreated`
#[derive(Debug, Clone, PartialEq)]
pub struct ViewCreatedEvent {
    pub id: ViewId,
    pub start_clocks: ClocksState,
    pub location: ViewLocation,
    pub referrer: String,
}

/// Payload of `ViewEnded`
#[derive(Debug, Clone, PartialEq)]
pub struct ViewEndedEvent {
    pub id: ViewId,
    pub end_clocks: ClocksState,
}

/// Payload of `ViewUpdated`: a full snapshot of the view
#[derive(Debug, Clone, PartialEq)]
pub struct ViewEvent {
    pub id: ViewId,
    pub start_clocks: ClocksState,
    pub location: ViewLocation,
    pub referrer: String,
    pub loading_type: ViewLoadingType,
    pub timings: ViewTimings,
    pub event_counts: EventCounts,
    pub cumulative_layout_shift: f64,
    pub loading_time: Option<f64>,
    pub document_version: u64,
    /// Elapsed ms since start; frozen once ended
    pub duration: f64,
    pub is_active: bool,
}

struct ViewState {
    location: ViewLocation,
    timings: ViewTimings,
    event_counts: EventCounts,
    cumulative_layout_shift: f64,
    loading_time: Option<f64>,
    loading_time_resolver: LoadingTimeResolver,
    document_version: u64,
    end_time: Option<RelativeTime>,
}

#[derive(Default)]
struct ViewTrackers {
    activity: Option<ActivityMonitor>,
    event_counts: Option<EventCountsTracker>,
    layout_shift: Option<Subscription>,
}

struct ViewInner {
    id: ViewId,
    start_clocks: ClocksState,
    referrer: String,
    loading_type: ViewLoadingType,
    lifecycle: LifeCycle,
    scheduler: Rc<Scheduler>,
    throttle: Throttle,
    state: RefCell<ViewState>,
    trackers: RefCell<ViewTrackers>,
}

/// Handle to a view; clones share the same view
#[derive(Clone)]
pub struct View {
    inner: Rc<ViewInner>,
}

impl View {
    /// Create a view, announce it and emit its first update
    pub fn start(
        lifecycle: &LifeCycle,
        scheduler: &Rc<Scheduler>,
        config: &Rc<Configuration>,
        location: ViewLocation,
        loading_type: ViewLoadingType,
        referrer: String,
    ) -> Self {
        let start_clocks = scheduler.clocks_now();
        let inner = Rc::new_cyclic(|weak: &Weak<ViewInner>| {
            let weak = weak.clone();
            ViewInner {
                id: ViewId::generate(),
                start_clocks,
                referrer,
                loading_type,
                lifecycle: lifecycle.clone(),
                scheduler: Rc::clone(scheduler),
                throttle: Throttle::new(
                    Rc::clone(scheduler),
                    config.view_update_throttle,
                    Rc::new(move || {
                        if let Some(inner) = weak.upgrade() {
                            inner.emit_update();
                        }
                    }),
                ),
                state: RefCell::new(ViewState {
                    location,
                    timings: ViewTimings::default(),
                    event_counts: EventCounts::default(),
                    cumulative_layout_shift: 0.0,
                    loading_time: None,
                    loading_time_resolver: LoadingTimeResolver::new(loading_type),
                    document_version: 0,
                    end_time: None,
                }),
                trackers: RefCell::new(ViewTrackers::default()),
            }
        });

        let created = ViewCreatedEvent {
            id: inner.id.clone(),
            start_clocks,
            location: inner.state.borrow().location.clone(),
            referrer: inner.referrer.clone(),
        };
        debug!(view_id = %created.id, ?loading_type, url = %created.location.href, "view created");
        lifecycle.notify(LifeCycleEvent::ViewCreated(created));

        let activity = {
            let weak = Rc::downgrade(&inner);
            let start = start_clocks.relative;
            ActivityMonitor::watch(
                lifecycle,
                Rc::clone(scheduler),
                Rc::clone(config),
                Box::new(move |completion| {
                    if let Some(inner) = weak.upgrade() {
                        let activity_loading_time = completion.end_time.map(|end| end - start);
                        inner.resolve_loading_time(|resolver| resolver.set_activity_loading_time(activity_loading_time));
                    }
                }),
            )
        };

        let event_counts = {
            let weak = Rc::downgrade(&inner);
            EventCountsTracker::start(
                lifecycle,
                Some(Rc::new(move |counts| {
                    if let Some(inner) = weak.upgrade() {
                        inner.state.borrow_mut().event_counts = counts;
                        inner.throttle.schedule();
                    }
                })),
            )
        };

        let layout_shift = {
            let weak = Rc::downgrade(&inner);
            track_layout_shift(
                lifecycle,
                Rc::new(move |value| {
                    if let Some(inner) = weak.upgrade() {
                        inner.state.borrow_mut().cumulative_layout_shift += value;
                        inner.throttle.schedule();
                    }
                }),
            )
        };

        *inner.trackers.borrow_mut() = ViewTrackers {
            activity: Some(activity),
            event_counts: Some(event_counts),
            layout_shift: Some(layout_shift),
        };

        inner.emit_update();
        Self { inner }
    }

    pub fn id(&self) -> &ViewId {
        &self.inner.id
    }

    pub fn loading_type(&self) -> ViewLoadingType {
        self.inner.loading_type
    }

    pub fn url(&self) -> String {
        self.inner.state.borrow().location.href.clone()
    }

    pub fn is_ended(&self) -> bool {
        self.inner.state.borrow().end_time.is_some()
    }

    /// Request a throttled update
    pub fn schedule_update(&self) {
        self.inner.throttle.schedule();
    }

    /// Emit an update now, dropping any pending throttled one
    pub fn trigger_update(&self) {
        self.inner.throttle.cancel();
        self.inner.emit_update();
    }

    /// End the view; idempotent
    pub fn end(&self) {
        let end_time = self.inner.scheduler.now();
        {
            let mut state = self.inner.state.borrow_mut();
            if state.end_time.is_some() {
                return;
            }
            state.end_time = Some(end_time);
        }

        let trackers = std::mem::take(&mut *self.inner.trackers.borrow_mut());
        if let Some(activity) = trackers.activity {
            activity.stop();
        }
        if let Some(event_counts) = trackers.event_counts {
            event_counts.stop();
        }
        if let Some(layout_shift) = trackers.layout_shift {
            layout_shift.unsubscribe();
        }

        debug!(view_id = %self.inner.id, end = %end_time, "view ended");
        self.inner.lifecycle.notify(LifeCycleEvent::ViewEnded(ViewEndedEvent {
            id: self.inner.id.clone(),
            end_clocks: self.inner.scheduler.clocks_at(end_time),
        }));
    }

    /// Whether `other` would start a new view
    pub fn is_different_view(&self, other: &ViewLocation, host: &dyn HostEnvironment) -> bool {
        are_different_location(&self.inner.state.borrow().location, other, host)
    }

    pub fn update_location(&self, location: ViewLocation) {
        self.inner.state.borrow_mut().location = location;
    }

    /// Replace the timings, feeding the load event into loading time
    pub fn update_timings(&self, timings: ViewTimings) {
        let load_event = timings.load_event;
        self.inner.state.borrow_mut().timings = timings;
        if let Some(load_event) = load_event {
            self.inner
                .resolve_loading_time(|resolver| resolver.set_load_event_end(load_event));
        }
    }

    /// Release every subscription and timer without emitting
    pub fn stop(&self) {
        self.inner.throttle.cancel();
        let trackers = std::mem::take(&mut *self.inner.trackers.borrow_mut());
        if let Some(activity) = trackers.activity {
            activity.stop();
        }
        if let Some(event_counts) = trackers.event_counts {
            event_counts.stop();
        }
        if let Some(layout_shift) = trackers.layout_shift {
            layout_shift.unsubscribe();
        }
    }
}

impl ViewInner {
    fn resolve_loading_time<F>(&self, report: F)
    where
        F: FnOnce(&mut LoadingTimeResolver) -> Option<f64>,
    {
        let resolved = {
            let mut state = self.state.borrow_mut();
            let resolved = report(&mut state.loading_time_resolver);
            if let Some(loading_time) = resolved {
                state.loading_time = Some(loading_time);
            }
            resolved
        };
        if resolved.is_some() {
            self.throttle.schedule();
        }
    }

    fn emit_update(&self) {
        let snapshot = {
            let mut state = self.state.borrow_mut();
            state.document_version += 1;
            let end = state.end_time.unwrap_or_else(|| self.scheduler.now());
            ViewEvent {
                id: self.id.clone(),
                start_clocks: self.start_clocks,
                location: state.location.clone(),
                referrer: self.referrer.clone(),
                loading_type: self.loading_type,
                timings: state.timings.clone(),
                event_counts: state.event_counts,
                cumulative_layout_shift: state.cumulative_layout_shift,
                loading_time: state.loading_time,
                document_version: state.document_version,
                duration: end - self.start_clocks.relative,
                is_active: state.end_time.is_none(),
            }
        };
        self.lifecycle.notify(LifeCycleEvent::ViewUpdated(snapshot));
    }
}
