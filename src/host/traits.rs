/*!
 * Host Traits
 * Collaborators the pipeline consumes but does not own
 */

use crate::lifecycle::ResourceTiming;

/// Session provider
pub trait SessionManager {
    /// Current session id, `None` once expired
    fn id(&self) -> Option<String>;

    /// Whether events of the current session are kept
    fn is_tracked(&self) -> bool;

    /// Whether resource events of the current session are kept
    fn is_tracked_with_resource(&self) -> bool;
}

/// Page environment queries
pub trait HostEnvironment {
    /// Whether the document holds an element with this id
    fn element_exists(&self, id: &str) -> bool;

    /// Whether the page is driven by a synthetic test bot
    fn is_synthetics(&self) -> bool {
        false
    }
}

/// Performance timeline lookup
pub trait PerformanceTimeline {
    /// Resource entries recorded for a URL, in recording order
    fn resource_entries_by_name(&self, url: &str) -> Vec<ResourceTiming>;
}
