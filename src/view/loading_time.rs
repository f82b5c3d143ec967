/*!
 * Loading Time
 * Resolves a view's loading time from its candidate sources
 *
 * The load-event-end candidate is only expected for the initial view; the
 * activity-settle candidate is expected for every view. Each source reports at
 * most once, and the maximum is taken once every expected source reported.
 */

use super::instance::ViewLoadingType;

#[derive(Debug, Clone)]
pub struct LoadingTimeResolver {
    waiting_for_load_event: bool,
    waiting_for_activity: bool,
    candidates: Vec<f64>,
}

impl LoadingTimeResolver {
    pub fn new(loading_type: ViewLoadingType) -> Self {
        Self {
            waiting_for_load_event: loading_type == ViewLoadingType::InitialLoad,
            waiting_for_activity: true,
            candidates: Vec::with_capacity(2),
        }
    }

    /// Report the load event end; returns the loading time if now resolved
    pub fn set_load_event_end(&mut self, load_event_end: f64) -> Option<f64> {
        if !self.waiting_for_load_event {
            return None;
        }
        self.waiting_for_load_event = false;
        self.candidates.push(load_event_end);
        self.resolve()
    }

    /// Report the activity-settle elapsed time, `None` when the view had no activity
    pub fn set_activity_loading_time(&mut self, activity_loading_time: Option<f64>) -> Option<f64> {
        if !self.waiting_for_activity {
            return None;
        }
        self.waiting_for_activity = false;
        if let Some(candidate) = activity_loading_time {
            self.candidates.push(candidate);
        }
        self.resolve()
    }

    fn resolve(&self) -> Option<f64> {
        if self.waiting_for_load_event || self.waiting_for_activity {
            return None;
        }
        self.candidates.iter().copied().reduce(f64::max)
    }
}
