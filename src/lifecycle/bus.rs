/*!
 * Lifecycle Bus
 * Synchronous in-process publish/subscribe partitioned by event kind
 *
 * Dispatch iterates a snapshot of the handlers registered for the kind, so a
 * handler unsubscribing (itself or another) during dispatch only affects later
 * notifications. Handlers may notify re-entrantly.
 */

use super::events::{LifeCycleEvent, LifeCycleEventKind};
use ahash::HashMap;
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};
use tracing::trace;

/// Handler callback type
pub type Handler = Rc<dyn Fn(&LifeCycleEvent)>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct SubscriptionId(u64);

struct Registry {
    next_id: Cell<u64>,
    handlers: RefCell<HashMap<LifeCycleEventKind, Vec<(SubscriptionId, Handler)>>>,
}

/// Lifecycle bus handle; clones share the same registry
#[derive(Clone)]
pub struct LifeCycle {
    registry: Rc<Registry>,
}

impl LifeCycle {
    pub fn new() -> Self {
        Self {
            registry: Rc::new(Registry {
                next_id: Cell::new(1),
                handlers: RefCell::new(HashMap::default()),
            }),
        }
    }

    /// Register a handler for one kind
    pub fn subscribe<F>(&self, kind: LifeCycleEventKind, handler: F) -> Subscription
    where
        F: Fn(&LifeCycleEvent) + 'static,
    {
        let id = SubscriptionId(self.registry.next_id.get());
        self.registry.next_id.set(id.0 + 1);

        self.registry
            .handlers
            .borrow_mut()
            .entry(kind)
            .or_default()
            .push((id, Rc::new(handler)));

        trace!(?kind, subscription = id.0, "lifecycle subscription added");
        Subscription {
            id,
            kind,
            registry: Rc::downgrade(&self.registry),
        }
    }

    /// Deliver an event to every current subscriber of its kind, in subscription order
    pub fn notify(&self, event: LifeCycleEvent) {
        let kind = event.kind();
        let snapshot: Vec<Handler> = match self.registry.handlers.borrow().get(&kind) {
            Some(handlers) => handlers.iter().map(|(_, handler)| Rc::clone(handler)).collect(),
            None => return,
        };

        for handler in snapshot {
            handler(&event);
        }
    }

    /// Number of handlers registered for a kind
    pub fn subscriber_count(&self, kind: LifeCycleEventKind) -> usize {
        self.registry
            .handlers
            .borrow()
            .get(&kind)
            .map(Vec::len)
            .unwrap_or(0)
    }
}

impl Default for LifeCycle {
    fn default() -> Self {
        Self::new()
    }
}

/// Registration handle returned by `LifeCycle::subscribe`
pub struct Subscription {
    id: SubscriptionId,
    kind: LifeCycleEventKind,
    registry: Weak<Registry>,
}

impl Subscription {
    /// Remove the handler; idempotent
    pub fn unsubscribe(&self) {
        let Some(registry) = self.registry.upgrade() else {
            return;
        };
        let mut handlers = registry.handlers.borrow_mut();
        if let Some(list) = handlers.get_mut(&self.kind) {
            list.retain(|(id, _)| *id != self.id);
        }
    }

    pub fn kind(&self) -> LifeCycleEventKind {
        self.kind
    }
}

/// Unsubscribe a batch of subscriptions
pub fn unsubscribe_all(subscriptions: &[Subscription]) {
    for subscription in subscriptions {
        subscription.unsubscribe();
    }
}
