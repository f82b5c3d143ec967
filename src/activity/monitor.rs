/*!
 * Activity Monitor
 * Idle-settle detection shared by view loading time and action duration
 *
 * Three timers race:
 * - validation: no signal within the delay means nothing ever started
 * - idle: restarted on every signal, armed only by idle signals; firing settles
 *   the span at the time of that idle signal
 * - max duration: forced cutoff at the current time, whatever the state
 *
 * The first to fire completes the monitor. The completion latch makes every
 * later timer or signal a no-op, and completion clears all timers.
 */

use super::signals::{ActivitySignal, PageActivityTracker};
use crate::core::config::{ActivityTimings, Configuration};
use crate::core::types::RelativeTime;
use crate::lifecycle::LifeCycle;
use crate::scheduler::{Scheduler, TimerId};
use std::cell::RefCell;
use std::rc::{Rc, Weak};
use std::time::Duration;
use tracing::trace;

/// Outcome of a monitored span
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActivityCompletion {
    /// End of the span; `None` when no activity was ever observed
    pub end_time: Option<RelativeTime>,
}

impl ActivityCompletion {
    #[inline]
    pub fn had_activity(&self) -> bool {
        self.end_time.is_some()
    }
}

/// Completion callback
pub type CompletionCallback = Box<dyn FnOnce(ActivityCompletion)>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    /// Started, no signal yet
    AwaitingFirstSignal,
    /// At least one signal proved the span started
    Monitoring,
    Completed,
}

struct MonitorState {
    phase: Phase,
    validation_timer: Option<TimerId>,
    max_duration_timer: Option<TimerId>,
    idle_timer: Option<TimerId>,
    callback: Option<CompletionCallback>,
    tracker: Option<PageActivityTracker>,
}

struct Shared {
    scheduler: Rc<Scheduler>,
    end_delay: Duration,
    state: RefCell<MonitorState>,
}

/// Handle to one monitored span; dropping it abandons the span silently
pub struct ActivityMonitor {
    shared: Rc<Shared>,
}

impl ActivityMonitor {
    /// Start a monitor fed manually through `signal`
    pub fn new(scheduler: Rc<Scheduler>, timings: ActivityTimings, callback: CompletionCallback) -> Self {
        let shared = Rc::new(Shared {
            scheduler: Rc::clone(&scheduler),
            end_delay: timings.end_delay,
            state: RefCell::new(MonitorState {
                phase: Phase::AwaitingFirstSignal,
                validation_timer: None,
                max_duration_timer: None,
                idle_timer: None,
                callback: Some(callback),
                tracker: None,
            }),
        });

        let weak = Rc::downgrade(&shared);
        let validation_timer = scheduler.set_timeout(timings.validation_delay, move || {
            complete(&weak, ActivityCompletion { end_time: None });
        });

        let weak = Rc::downgrade(&shared);
        let sched = Rc::clone(&scheduler);
        let max_duration_timer = scheduler.set_timeout(timings.max_duration, move || {
            complete(
                &weak,
                ActivityCompletion {
                    end_time: Some(sched.now()),
                },
            );
        });

        {
            let mut state = shared.state.borrow_mut();
            state.validation_timer = Some(validation_timer);
            state.max_duration_timer = Some(max_duration_timer);
        }

        Self { shared }
    }

    /// Start a monitor fed by page activity observed on the bus
    pub fn watch(
        lifecycle: &LifeCycle,
        scheduler: Rc<Scheduler>,
        config: Rc<Configuration>,
        callback: CompletionCallback,
    ) -> Self {
        let monitor = Self::new(scheduler, config.activity, callback);

        let weak = Rc::downgrade(&monitor.shared);
        let tracker = PageActivityTracker::start(
            lifecycle,
            config,
            Rc::new(move |signal| {
                if let Some(shared) = weak.upgrade() {
                    handle_signal(&shared, signal);
                }
            }),
        );
        monitor.shared.state.borrow_mut().tracker = Some(tracker);
        monitor
    }

    /// Feed one activity signal
    pub fn signal(&self, signal: ActivitySignal) {
        handle_signal(&self.shared, signal);
    }

    /// Abandon the span without invoking the callback
    pub fn stop(&self) {
        let tracker = {
            let mut state = self.shared.state.borrow_mut();
            if state.phase == Phase::Completed {
                return;
            }
            state.phase = Phase::Completed;
            state.callback = None;
            clear_timers(&self.shared.scheduler, &mut state);
            state.tracker.take()
        };
        if let Some(tracker) = tracker {
            tracker.stop();
        }
    }

    pub fn is_completed(&self) -> bool {
        self.shared.state.borrow().phase == Phase::Completed
    }
}

fn handle_signal(shared: &Rc<Shared>, signal: ActivitySignal) {
    let mut state = shared.state.borrow_mut();
    if state.phase == Phase::Completed {
        return;
    }

    // Cancel before rescheduling: any signal proves the span started and
    // restarts the idle debounce.
    if let Some(timer) = state.validation_timer.take() {
        shared.scheduler.clear(timer);
    }
    if let Some(timer) = state.idle_timer.take() {
        shared.scheduler.clear(timer);
    }
    state.phase = Phase::Monitoring;

    if !signal.busy {
        let last_change = shared.scheduler.now();
        let weak = Rc::downgrade(shared);
        state.idle_timer = Some(shared.scheduler.set_timeout(shared.end_delay, move || {
            complete(
                &weak,
                ActivityCompletion {
                    end_time: Some(last_change),
                },
            );
        }));
    }
}

fn clear_timers(scheduler: &Scheduler, state: &mut MonitorState) {
    for timer in [
        state.validation_timer.take(),
        state.max_duration_timer.take(),
        state.idle_timer.take(),
    ]
    .into_iter()
    .flatten()
    {
        scheduler.clear(timer);
    }
}

fn complete(weak: &Weak<Shared>, completion: ActivityCompletion) {
    let Some(shared) = weak.upgrade() else {
        return;
    };

    let (callback, tracker) = {
        let mut state = shared.state.borrow_mut();
        if state.phase == Phase::Completed {
            return;
        }
        state.phase = Phase::Completed;
        clear_timers(&shared.scheduler, &mut state);
        (state.callback.take(), state.tracker.take())
    };

    if let Some(tracker) = tracker {
        tracker.stop();
    }

    trace!(end_time = ?completion.end_time, "activity monitor completed");
    if let Some(callback) = callback {
        callback(completion);
    }
}
