/*!
 * Parent Contexts
 * View and action contexts resolvable by event start time
 *
 * The current view and action are kept alongside a newest-first history of
 * ended ones. History entries expire after a per-kind timeout and everything
 * is forgotten when the session renews.
 */

use crate::core::limits::{ACTION_CONTEXT_TIME_OUT_DELAY, CLEAR_OLD_CONTEXTS_INTERVAL, VIEW_CONTEXT_TIME_OUT_DELAY};
use crate::core::types::{ActionId, RelativeTime, ViewId};
use crate::host::SessionManager;
use crate::lifecycle::{unsubscribe_all, LifeCycle, LifeCycleEvent, LifeCycleEventKind, Subscription};
use crate::scheduler::{Scheduler, TimerId};
use serde::Serialize;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::Duration;
use tracing::debug;

/// View identity attached to every assembled event
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewContext {
    /// Session the view was created in
    #[serde(skip)]
    pub session_id: Option<String>,
    pub view: ViewRef,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewRef {
    pub id: ViewId,
    pub referrer: String,
    pub url: String,
}

/// Action identity attached to child events
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionContext {
    pub action: ActionRef,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionRef {
    pub id: ActionId,
}

#[derive(Debug, Clone)]
struct CurrentContext<T> {
    context: T,
    start_time: RelativeTime,
}

#[derive(Debug, Clone)]
struct PreviousContext<T> {
    context: T,
    start_time: RelativeTime,
    end_time: RelativeTime,
}

#[derive(Default)]
struct ContextsState {
    current_view: Option<CurrentContext<ViewContext>>,
    current_action: Option<CurrentContext<ActionContext>>,
    previous_views: VecDeque<PreviousContext<ViewContext>>,
    previous_actions: VecDeque<PreviousContext<ActionContext>>,
}

impl ContextsState {
    fn clear(&mut self) {
        *self = Self::default();
    }
}

/// Tracks view and action contexts for assembly
pub struct ParentContexts {
    scheduler: Rc<Scheduler>,
    state: Rc<RefCell<ContextsState>>,
    subscriptions: Vec<Subscription>,
    cleanup_timer: TimerId,
}

impl ParentContexts {
    pub fn start(lifecycle: &LifeCycle, scheduler: Rc<Scheduler>, session: Rc<dyn SessionManager>) -> Self {
        let state = Rc::new(RefCell::new(ContextsState::default()));
        let mut subscriptions = Vec::with_capacity(6);

        {
            let state = Rc::clone(&state);
            subscriptions.push(lifecycle.subscribe(LifeCycleEventKind::ViewCreated, move |event| {
                let LifeCycleEvent::ViewCreated(created) = event else {
                    return;
                };
                let mut state = state.borrow_mut();
                if let Some(previous) = state.current_view.take() {
                    state.previous_views.push_front(PreviousContext {
                        context: previous.context,
                        start_time: previous.start_time,
                        end_time: created.start_clocks.relative,
                    });
                }
                state.current_view = Some(CurrentContext {
                    context: ViewContext {
                        session_id: session.id(),
                        view: ViewRef {
                            id: created.id.clone(),
                            referrer: created.referrer.clone(),
                            url: created.location.href.clone(),
                        },
                    },
                    start_time: created.start_clocks.relative,
                });
            }));
        }

        {
            let state = Rc::clone(&state);
            subscriptions.push(lifecycle.subscribe(LifeCycleEventKind::ViewUpdated, move |event| {
                let LifeCycleEvent::ViewUpdated(update) = event else {
                    return;
                };
                let mut state = state.borrow_mut();
                if let Some(current) = state.current_view.as_mut() {
                    if current.context.view.id == update.id {
                        current.context.view.url = update.location.href.clone();
                    }
                }
            }));
        }

        {
            let state = Rc::clone(&state);
            subscriptions.push(lifecycle.subscribe(LifeCycleEventKind::AutoActionCreated, move |event| {
                let LifeCycleEvent::AutoActionCreated(created) = event else {
                    return;
                };
                state.borrow_mut().current_action = Some(CurrentContext {
                    context: ActionContext {
                        action: ActionRef { id: created.id.clone() },
                    },
                    start_time: created.start_clocks.relative,
                });
            }));
        }

        {
            let state = Rc::clone(&state);
            subscriptions.push(lifecycle.subscribe(LifeCycleEventKind::AutoActionCompleted, move |event| {
                let LifeCycleEvent::AutoActionCompleted(action) = event else {
                    return;
                };
                let mut state = state.borrow_mut();
                if let Some(current) = state.current_action.take() {
                    state.previous_actions.push_front(PreviousContext {
                        context: current.context,
                        start_time: current.start_time,
                        end_time: current.start_time + action.duration,
                    });
                }
            }));
        }

        {
            let state = Rc::clone(&state);
            subscriptions.push(lifecycle.subscribe(LifeCycleEventKind::AutoActionDiscarded, move |_| {
                state.borrow_mut().current_action = None;
            }));
        }

        {
            let state = Rc::clone(&state);
            subscriptions.push(lifecycle.subscribe(LifeCycleEventKind::SessionRenewed, move |_| {
                debug!("session renewed, forgetting parent contexts");
                state.borrow_mut().clear();
            }));
        }

        let cleanup_timer = {
            let weak_state = Rc::downgrade(&state);
            let weak_scheduler = Rc::downgrade(&scheduler);
            scheduler.set_interval(CLEAR_OLD_CONTEXTS_INTERVAL, move || {
                let (Some(state), Some(scheduler)) = (weak_state.upgrade(), weak_scheduler.upgrade()) else {
                    return;
                };
                let now = scheduler.now();
                let mut state = state.borrow_mut();
                clear_old_contexts(&mut state.previous_views, now, VIEW_CONTEXT_TIME_OUT_DELAY);
                clear_old_contexts(&mut state.previous_actions, now, ACTION_CONTEXT_TIME_OUT_DELAY);
            })
        };

        Self {
            scheduler,
            state,
            subscriptions,
            cleanup_timer,
        }
    }

    /// View context active at `start_time`, or the current one when `None`
    pub fn find_view(&self, start_time: Option<RelativeTime>) -> Option<ViewContext> {
        let state = self.state.borrow();
        find_context(state.current_view.as_ref(), &state.previous_views, start_time)
    }

    /// Action context active at `start_time`, or the current one when `None`
    pub fn find_action(&self, start_time: Option<RelativeTime>) -> Option<ActionContext> {
        let state = self.state.borrow();
        find_context(state.current_action.as_ref(), &state.previous_actions, start_time)
    }

    pub fn stop(&self) {
        unsubscribe_all(&self.subscriptions);
        self.scheduler.clear(self.cleanup_timer);
        self.state.borrow_mut().clear();
    }
}

fn find_context<T: Clone>(
    current: Option<&CurrentContext<T>>,
    previous: &VecDeque<PreviousContext<T>>,
    start_time: Option<RelativeTime>,
) -> Option<T> {
    let Some(start_time) = start_time else {
        return current.map(|current| current.context.clone());
    };

    if let Some(current) = current {
        if start_time >= current.start_time {
            return Some(current.context.clone());
        }
    }

    for context in previous {
        if start_time > context.end_time {
            break;
        }
        if start_time >= context.start_time {
            return Some(context.context.clone());
        }
    }
    None
}

fn clear_old_contexts<T>(previous: &mut VecDeque<PreviousContext<T>>, now: RelativeTime, timeout: Duration) {
    let threshold = now.millis() - timeout.as_secs_f64() * 1000.0;
    while previous
        .back()
        .map(|oldest| oldest.end_time.millis() < threshold)
        .unwrap_or(false)
    {
        previous.pop_back();
    }
}
