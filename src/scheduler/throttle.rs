/*!
 * Trailing-Edge Throttle
 * Coalesces bursts of requests into one call at the end of a fixed window
 */

use super::timer::{Scheduler, TimerId};
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

#[derive(Default)]
struct ThrottleState {
    in_wait_period: bool,
    pending: bool,
    timer: Option<TimerId>,
}

/// Trailing-only throttle
///
/// The first `schedule()` opens a window; the wrapped function runs once when the
/// window closes, however many times `schedule()` was called inside it.
pub struct Throttle {
    scheduler: Rc<Scheduler>,
    wait: Duration,
    func: Rc<dyn Fn()>,
    state: Rc<RefCell<ThrottleState>>,
}

impl Throttle {
    pub fn new(scheduler: Rc<Scheduler>, wait: Duration, func: Rc<dyn Fn()>) -> Self {
        Self {
            scheduler,
            wait,
            func,
            state: Rc::new(RefCell::new(ThrottleState::default())),
        }
    }

    /// Request a call at the end of the current window
    pub fn schedule(&self) {
        let mut state = self.state.borrow_mut();
        state.pending = true;
        if state.in_wait_period {
            return;
        }
        state.in_wait_period = true;

        let weak_state = Rc::downgrade(&self.state);
        let func = Rc::clone(&self.func);
        state.timer = Some(self.scheduler.set_timeout(self.wait, move || {
            let Some(state) = weak_state.upgrade() else {
                return;
            };
            let run = {
                let mut state = state.borrow_mut();
                let run = state.pending;
                *state = ThrottleState::default();
                run
            };
            if run {
                func();
            }
        }));
    }

    /// Drop any pending call and close the current window
    pub fn cancel(&self) {
        let mut state = self.state.borrow_mut();
        if let Some(timer) = state.timer.take() {
            self.scheduler.clear(timer);
        }
        *state = ThrottleState::default();
    }

    /// Whether a trailing call is waiting
    pub fn is_pending(&self) -> bool {
        self.state.borrow().pending
    }
}
