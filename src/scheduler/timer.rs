/*!
 * Timer Scheduler
 * Single-threaded cooperative event loop driving every delay in the pipeline
 *
 * Time only moves when the host calls `advance_to`/`advance_by`. Due timers fire
 * in due order (ties in scheduling order) with the clock set to their due time,
 * so callbacks observe exactly the instant they were scheduled for.
 */

use crate::core::types::{ClocksState, RelativeTime, TimeStamp};
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;
use tracing::{trace, warn};

/// Handle to a scheduled timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerId(u64);

enum Callback {
    Once(Box<dyn FnOnce()>),
    Repeat { period: f64, callback: Rc<dyn Fn()> },
}

struct TimerEntry {
    id: TimerId,
    due: RelativeTime,
    seq: u64,
    callback: Callback,
}

struct SchedulerState {
    now: RelativeTime,
    next_id: u64,
    next_seq: u64,
    timers: Vec<TimerEntry>,
}

/// Timer scheduler with a virtual clock
pub struct Scheduler {
    time_origin: TimeStamp,
    state: RefCell<SchedulerState>,
}

#[inline]
fn to_millis(duration: Duration) -> f64 {
    duration.as_secs_f64() * 1000.0
}

impl Scheduler {
    /// Create a scheduler whose relative clock starts at zero
    pub fn new(time_origin: TimeStamp) -> Rc<Self> {
        Rc::new(Self {
            time_origin,
            state: RefCell::new(SchedulerState {
                now: RelativeTime::ZERO,
                next_id: 1,
                next_seq: 0,
                timers: Vec::new(),
            }),
        })
    }

    /// Current relative time
    #[inline]
    pub fn now(&self) -> RelativeTime {
        self.state.borrow().now
    }

    /// Current time on both clocks
    #[inline]
    pub fn clocks_now(&self) -> ClocksState {
        ClocksState::at(self.now(), self.time_origin)
    }

    /// Clocks for an arbitrary relative time
    #[inline]
    pub fn clocks_at(&self, relative: RelativeTime) -> ClocksState {
        ClocksState::at(relative, self.time_origin)
    }

    #[inline]
    pub fn time_origin(&self) -> TimeStamp {
        self.time_origin
    }

    /// Run `callback` once after `delay`
    pub fn set_timeout<F>(&self, delay: Duration, callback: F) -> TimerId
    where
        F: FnOnce() + 'static,
    {
        self.insert(to_millis(delay), Callback::Once(Box::new(callback)))
    }

    /// Run `callback` every `period` until cleared
    pub fn set_interval<F>(&self, period: Duration, callback: F) -> TimerId
    where
        F: Fn() + 'static,
    {
        let mut period = to_millis(period);
        if period <= 0.0 {
            warn!("Zero interval period requested, clamping to 1ms");
            period = 1.0;
        }
        self.insert(
            period,
            Callback::Repeat {
                period,
                callback: Rc::new(callback),
            },
        )
    }

    fn insert(&self, delay_ms: f64, callback: Callback) -> TimerId {
        let mut state = self.state.borrow_mut();
        let id = TimerId(state.next_id);
        state.next_id += 1;
        let seq = state.next_seq;
        state.next_seq += 1;
        let due = state.now + delay_ms.max(0.0);
        state.timers.push(TimerEntry {
            id,
            due,
            seq,
            callback,
        });
        id
    }

    /// Cancel a timer; clearing an unknown or fired timer is a no-op
    pub fn clear(&self, id: TimerId) {
        self.state.borrow_mut().timers.retain(|timer| timer.id != id);
    }

    /// Number of scheduled timers
    pub fn pending(&self) -> usize {
        self.state.borrow().timers.len()
    }

    /// Due time of the next timer, if any
    pub fn next_due(&self) -> Option<RelativeTime> {
        self.state
            .borrow()
            .timers
            .iter()
            .map(|timer| timer.due)
            .min_by(|a, b| a.0.total_cmp(&b.0))
    }

    /// Advance the clock by `duration`, firing every timer that falls due
    pub fn advance_by(&self, duration: Duration) -> usize {
        let target = self.now() + to_millis(duration);
        self.advance_to(target)
    }

    /// Advance the clock to `target`, firing every timer that falls due
    ///
    /// Returns the number of callbacks run. The clock never moves backwards.
    pub fn advance_to(&self, target: RelativeTime) -> usize {
        let mut fired = 0;

        loop {
            let next = {
                let mut state = self.state.borrow_mut();
                let position = state
                    .timers
                    .iter()
                    .enumerate()
                    .filter(|(_, timer)| timer.due <= target)
                    .min_by(|(_, a), (_, b)| a.due.0.total_cmp(&b.due.0).then(a.seq.cmp(&b.seq)))
                    .map(|(index, _)| index);

                match position {
                    None => None,
                    Some(index) => {
                        let entry = state.timers.swap_remove(index);
                        if entry.due > state.now {
                            state.now = entry.due;
                        }
                        match entry.callback {
                            Callback::Once(callback) => Some(Fired::Once(callback)),
                            Callback::Repeat { period, callback } => {
                                let seq = state.next_seq;
                                state.next_seq += 1;
                                state.timers.push(TimerEntry {
                                    id: entry.id,
                                    due: entry.due + period,
                                    seq,
                                    callback: Callback::Repeat {
                                        period,
                                        callback: Rc::clone(&callback),
                                    },
                                });
                                Some(Fired::Repeat(callback))
                            }
                        }
                    }
                }
            };

            // The borrow is released before running user code so callbacks can
            // schedule or clear timers freely.
            match next {
                None => break,
                Some(Fired::Once(callback)) => callback(),
                Some(Fired::Repeat(callback)) => callback(),
            }
            fired += 1;
        }

        let mut state = self.state.borrow_mut();
        if target > state.now {
            state.now = target;
        }
        trace!(now = state.now.0, fired, "scheduler advanced");
        fired
    }
}

enum Fired {
    Once(Box<dyn FnOnce()>),
    Repeat(Rc<dyn Fn()>),
}
