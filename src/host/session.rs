/*!
 * In-Memory Session
 * Session provider with explicit renewal and expiry
 */

use super::traits::SessionManager;
use std::cell::RefCell;
use tracing::debug;
use uuid::Uuid;

#[derive(Debug, Clone)]
struct SessionState {
    id: Option<String>,
    tracked: bool,
    tracked_with_resource: bool,
}

/// Session held in memory
///
/// Renewal only swaps the id; notifying the pipeline is the caller's job
/// (`RumPipeline::renew_session`).
#[derive(Debug)]
pub struct StaticSession {
    state: RefCell<SessionState>,
}

impl StaticSession {
    /// Tracked session with resources
    pub fn tracked() -> Self {
        Self::with_plan(true, true)
    }

    /// Tracked session without resources
    pub fn tracked_without_resources() -> Self {
        Self::with_plan(true, false)
    }

    /// Sampled-out session; every event is dropped
    pub fn untracked() -> Self {
        Self::with_plan(false, false)
    }

    fn with_plan(tracked: bool, tracked_with_resource: bool) -> Self {
        Self {
            state: RefCell::new(SessionState {
                id: Some(Uuid::new_v4().to_string()),
                tracked,
                tracked_with_resource: tracked && tracked_with_resource,
            }),
        }
    }

    /// Start a new session, returning its id
    pub fn renew(&self) -> String {
        let id = Uuid::new_v4().to_string();
        self.state.borrow_mut().id = Some(id.clone());
        debug!(session_id = %id, "session renewed");
        id
    }

    /// Drop the current id
    pub fn expire(&self) {
        self.state.borrow_mut().id = None;
        debug!("session expired");
    }
}

impl Default for StaticSession {
    fn default() -> Self {
        Self::tracked()
    }
}

impl SessionManager for StaticSession {
    fn id(&self) -> Option<String> {
        self.state.borrow().id.clone()
    }

    fn is_tracked(&self) -> bool {
        let state = self.state.borrow();
        state.id.is_some() && state.tracked
    }

    fn is_tracked_with_resource(&self) -> bool {
        let state = self.state.borrow();
        state.id.is_some() && state.tracked_with_resource
    }
}
