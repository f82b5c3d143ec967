/*!
 * Page Activity Signals
 * Derives a busy/idle stream from mutation, resource and request events
 */

use crate::core::config::Configuration;
use crate::lifecycle::{unsubscribe_all, LifeCycle, LifeCycleEvent, LifeCycleEventKind, PerformanceEntry, Subscription};
use std::cell::Cell;
use std::rc::Rc;

/// "Something happened" notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActivitySignal {
    /// True while at least one request started under this tracker is pending
    pub busy: bool,
}

/// Signal sink
pub type SignalSink = Rc<dyn Fn(ActivitySignal)>;

#[derive(Default)]
struct RequestCounter {
    first_request_index: Cell<Option<u64>>,
    pending: Cell<u32>,
}

/// Bus listener turning page activity into `ActivitySignal`s
///
/// Requests completing that started before the tracker did are ignored, so the
/// pending count only reflects requests observed from the start.
pub struct PageActivityTracker {
    subscriptions: Vec<Subscription>,
}

impl PageActivityTracker {
    pub fn start(lifecycle: &LifeCycle, config: Rc<Configuration>, sink: SignalSink) -> Self {
        let counter = Rc::new(RequestCounter::default());
        let mut subscriptions = Vec::with_capacity(4);

        let emit = {
            let counter = Rc::clone(&counter);
            let sink = Rc::clone(&sink);
            Rc::new(move || {
                sink(ActivitySignal {
                    busy: counter.pending.get() > 0,
                })
            })
        };

        {
            let emit = Rc::clone(&emit);
            subscriptions.push(lifecycle.subscribe(LifeCycleEventKind::DomMutated, move |_| emit()));
        }

        {
            let emit = Rc::clone(&emit);
            subscriptions.push(
                lifecycle.subscribe(LifeCycleEventKind::PerformanceEntryCollected, move |event| {
                    if let LifeCycleEvent::PerformanceEntryCollected(PerformanceEntry::Resource(timing)) = event {
                        if !config.is_intake_url(&timing.name) {
                            emit();
                        }
                    }
                }),
            );
        }

        {
            let emit = Rc::clone(&emit);
            let counter = Rc::clone(&counter);
            subscriptions.push(lifecycle.subscribe(LifeCycleEventKind::RequestStarted, move |event| {
                if let LifeCycleEvent::RequestStarted(start) = event {
                    if counter.first_request_index.get().is_none() {
                        counter.first_request_index.set(Some(start.request_index));
                    }
                    counter.pending.set(counter.pending.get() + 1);
                    emit();
                }
            }));
        }

        {
            let emit = Rc::clone(&emit);
            let counter = Rc::clone(&counter);
            subscriptions.push(lifecycle.subscribe(LifeCycleEventKind::RequestCompleted, move |event| {
                if let LifeCycleEvent::RequestCompleted(request) = event {
                    match counter.first_request_index.get() {
                        Some(first) if request.request_index >= first => {
                            counter.pending.set(counter.pending.get().saturating_sub(1));
                            emit();
                        }
                        _ => {}
                    }
                }
            }));
        }

        Self { subscriptions }
    }

    pub fn stop(&self) {
        unsubscribe_all(&self.subscriptions);
    }
}
