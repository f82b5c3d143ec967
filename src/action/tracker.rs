/*!
 * Action Tracker
 * Detects user actions from clicks and resolves them through page activity
 *
 * At most one action is pending. A click while one is pending is ignored, and
 * creating a view discards the pending action so actions never span views.
 */

use super::name::{action_name, ElementSnapshot};
use crate::activity::{ActivityCompletion, ActivityMonitor};
use crate::core::config::Configuration;
use crate::core::types::{ActionId, ClocksState};
use crate::lifecycle::{unsubscribe_all, LifeCycle, LifeCycleEvent, LifeCycleEventKind, Subscription};
use crate::scheduler::Scheduler;
use crate::view::EventCountsTracker;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::rc::Rc;
use tracing::{debug, trace};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    Click,
    Custom,
}

/// Payload of `AutoActionCreated`
#[derive(Debug, Clone, PartialEq)]
pub struct ActionCreatedEvent {
    pub id: ActionId,
    pub start_clocks: ClocksState,
}

/// Child events raised while an action was pending
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ActionCounts {
    pub error_count: u64,
    pub long_task_count: u64,
    pub resource_count: u64,
}

/// Payload of `AutoActionCompleted`
#[derive(Debug, Clone, PartialEq)]
pub struct CompletedAction {
    pub id: ActionId,
    pub action_type: ActionType,
    pub name: String,
    pub start_clocks: ClocksState,
    /// Elapsed ms from the click to the settle point
    pub duration: f64,
    pub counts: ActionCounts,
}

struct PendingAction {
    id: ActionId,
    name: String,
    start_clocks: ClocksState,
    counts: EventCountsTracker,
    monitor: Option<ActivityMonitor>,
}

struct TrackerInner {
    lifecycle: LifeCycle,
    scheduler: Rc<Scheduler>,
    config: Rc<Configuration>,
    pending: RefCell<Option<PendingAction>>,
}

pub struct ActionTracker {
    inner: Rc<TrackerInner>,
    subscriptions: Vec<Subscription>,
}

impl ActionTracker {
    pub fn start(lifecycle: &LifeCycle, scheduler: Rc<Scheduler>, config: Rc<Configuration>) -> Self {
        let inner = Rc::new(TrackerInner {
            lifecycle: lifecycle.clone(),
            scheduler,
            config,
            pending: RefCell::new(None),
        });

        let weak = Rc::downgrade(&inner);
        let subscription = lifecycle.subscribe(LifeCycleEventKind::ViewCreated, move |_| {
            if let Some(inner) = weak.upgrade() {
                inner.discard_current();
            }
        });

        Self {
            inner,
            subscriptions: vec![subscription],
        }
    }

    /// Handle a click on `target`
    ///
    /// Returns the id of the action created, if any.
    pub fn click(&self, target: &ElementSnapshot) -> Option<ActionId> {
        if !self.inner.config.track_interactions {
            return None;
        }
        if self.inner.pending.borrow().is_some() {
            trace!("click ignored, an action is already pending");
            return None;
        }

        let name = action_name(target);
        if name.is_empty() {
            trace!("click ignored, target has no usable name");
            return None;
        }

        Some(self.inner.create(name))
    }

    pub fn has_pending_action(&self) -> bool {
        self.inner.pending.borrow().is_some()
    }

    /// Discard any pending action and stop listening
    pub fn stop(&self) {
        unsubscribe_all(&self.subscriptions);
        self.inner.discard_current();
    }
}

impl TrackerInner {
    fn create(self: &Rc<Self>, name: String) -> ActionId {
        let id = ActionId::generate();
        let start_clocks = self.scheduler.clocks_now();

        *self.pending.borrow_mut() = Some(PendingAction {
            id: id.clone(),
            name,
            start_clocks,
            counts: EventCountsTracker::start(&self.lifecycle, None),
            monitor: None,
        });

        debug!(action_id = %id, start = %start_clocks.relative, "action created");
        self.lifecycle.notify(LifeCycleEvent::AutoActionCreated(ActionCreatedEvent {
            id: id.clone(),
            start_clocks,
        }));

        let weak = Rc::downgrade(self);
        let action_id = id.clone();
        let monitor = ActivityMonitor::watch(
            &self.lifecycle,
            Rc::clone(&self.scheduler),
            Rc::clone(&self.config),
            Box::new(move |completion| {
                if let Some(inner) = weak.upgrade() {
                    inner.resolve(&action_id, completion);
                }
            }),
        );

        match self.pending.borrow_mut().as_mut() {
            Some(pending) if pending.id == id => pending.monitor = Some(monitor),
            _ => monitor.stop(),
        }
        id
    }

    fn resolve(&self, id: &ActionId, completion: ActivityCompletion) {
        let pending = {
            let mut slot = self.pending.borrow_mut();
            match slot.as_ref() {
                Some(pending) if pending.id == *id => slot.take(),
                _ => None,
            }
        };
        let Some(pending) = pending else {
            return;
        };

        let counts = pending.counts.counts();
        pending.counts.stop();

        match completion.end_time {
            Some(end_time) => {
                let action = CompletedAction {
                    id: pending.id,
                    action_type: ActionType::Click,
                    name: pending.name,
                    start_clocks: pending.start_clocks,
                    duration: end_time - pending.start_clocks.relative,
                    counts: ActionCounts {
                        error_count: counts.error_count,
                        long_task_count: counts.long_task_count,
                        resource_count: counts.resource_count,
                    },
                };
                debug!(action_id = %action.id, duration = action.duration, "action completed");
                self.lifecycle.notify(LifeCycleEvent::AutoActionCompleted(action));
            }
            None => {
                debug!(action_id = %pending.id, "action discarded, no activity");
                self.lifecycle.notify(LifeCycleEvent::AutoActionDiscarded);
            }
        }
    }

    fn discard_current(&self) {
        let Some(pending) = self.pending.borrow_mut().take() else {
            return;
        };

        if let Some(monitor) = &pending.monitor {
            monitor.stop();
        }
        pending.counts.stop();
        debug!(action_id = %pending.id, "pending action discarded");
        self.lifecycle.notify(LifeCycleEvent::AutoActionDiscarded);
    }
}
