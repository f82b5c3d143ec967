/*!
 * View Tracker
 * Owns the current view and replaces it on navigation and session renewal
 */

use super::instance::{View, ViewLoadingType};
use super::location::ViewLocation;
use super::timings::InitialViewTimingsTracker;
use crate::core::config::Configuration;
use crate::core::types::ViewId;
use crate::host::HostEnvironment;
use crate::lifecycle::{unsubscribe_all, LifeCycle, LifeCycleEventKind, Subscription};
use crate::scheduler::{Scheduler, TimerId};
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};
use tracing::{debug, info};

struct TrackerInner {
    lifecycle: LifeCycle,
    scheduler: Rc<Scheduler>,
    config: Rc<Configuration>,
    host: Rc<dyn HostEnvironment>,
    current: RefCell<View>,
    initial_timings: RefCell<Option<InitialViewTimingsTracker>>,
    subscriptions: RefCell<Vec<Subscription>>,
    keep_alive: Cell<Option<TimerId>>,
}

/// Exactly one current view at any time
pub struct ViewTracker {
    inner: Rc<TrackerInner>,
}

impl ViewTracker {
    /// Create the initial view and start listening
    pub fn start(
        lifecycle: &LifeCycle,
        scheduler: Rc<Scheduler>,
        config: Rc<Configuration>,
        host: Rc<dyn HostEnvironment>,
        location: ViewLocation,
        referrer: String,
    ) -> Self {
        let initial = View::start(
            lifecycle,
            &scheduler,
            &config,
            location,
            ViewLoadingType::InitialLoad,
            referrer,
        );
        info!(view_id = %initial.id(), "initial view started");

        let initial_timings = {
            let view = initial.clone();
            InitialViewTimingsTracker::start(
                lifecycle,
                Rc::new(move |timings| {
                    view.update_timings(timings);
                    view.schedule_update();
                }),
            )
        };

        let inner = Rc::new(TrackerInner {
            lifecycle: lifecycle.clone(),
            scheduler: Rc::clone(&scheduler),
            config,
            host,
            current: RefCell::new(initial),
            initial_timings: RefCell::new(Some(initial_timings)),
            subscriptions: RefCell::new(Vec::with_capacity(2)),
            keep_alive: Cell::new(None),
        });

        let mut subscriptions = Vec::with_capacity(2);
        {
            let weak = Rc::downgrade(&inner);
            subscriptions.push(lifecycle.subscribe(LifeCycleEventKind::SessionRenewed, move |_| {
                if let Some(inner) = weak.upgrade() {
                    debug!("session renewed, replacing current view");
                    inner.replace_current(None);
                }
            }));
        }
        {
            let weak = Rc::downgrade(&inner);
            subscriptions.push(lifecycle.subscribe(LifeCycleEventKind::BeforeUnload, move |_| {
                if let Some(inner) = weak.upgrade() {
                    let current = inner.current();
                    current.end();
                    current.trigger_update();
                }
            }));
        }
        *inner.subscriptions.borrow_mut() = subscriptions;

        let weak: Weak<TrackerInner> = Rc::downgrade(&inner);
        let keep_alive = scheduler.set_interval(inner.config.session_keep_alive, move || {
            if let Some(inner) = weak.upgrade() {
                let current = inner.current();
                if !current.is_ended() {
                    current.trigger_update();
                }
            }
        });
        inner.keep_alive.set(Some(keep_alive));

        Self { inner }
    }

    /// Handle a history or hash change
    pub fn location_changed(&self, location: ViewLocation) {
        let current = self.inner.current();
        if current.is_different_view(&location, self.inner.host.as_ref()) {
            debug!(from = %current.url(), to = %location.href, "route change");
            self.inner.replace_current(Some(location));
        } else {
            current.update_location(location);
            current.trigger_update();
        }
    }

    pub fn current_view(&self) -> View {
        self.inner.current()
    }

    pub fn current_view_id(&self) -> ViewId {
        self.inner.current().id().clone()
    }

    /// Stop listening and release the current view without emitting
    pub fn stop(&self) {
        unsubscribe_all(&self.inner.subscriptions.borrow());
        if let Some(timer) = self.inner.keep_alive.take() {
            self.inner.scheduler.clear(timer);
        }
        if let Some(timings) = self.inner.initial_timings.borrow_mut().take() {
            timings.stop();
        }
        self.inner.current().stop();
    }
}

impl TrackerInner {
    fn current(&self) -> View {
        self.current.borrow().clone()
    }

    /// End the current view and start a route change view at `location`
    /// (the current location when `None`)
    fn replace_current(&self, location: Option<ViewLocation>) {
        let previous = self.current();
        previous.end();
        previous.trigger_update();

        let referrer = previous.url();
        let location = match location {
            Some(location) => location,
            None => match ViewLocation::parse(&referrer) {
                Ok(location) => location,
                Err(e) => {
                    debug!(error = %e, "current location unparsable, keeping ended view");
                    return;
                }
            },
        };

        let next = View::start(
            &self.lifecycle,
            &self.scheduler,
            &self.config,
            location,
            ViewLoadingType::RouteChange,
            referrer,
        );
        *self.current.borrow_mut() = next;
    }
}
