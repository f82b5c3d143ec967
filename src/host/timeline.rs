/*!
 * Resource Timing Buffer
 * Bounded in-memory performance timeline fed from the lifecycle bus
 */

use super::traits::PerformanceTimeline;
use crate::core::limits::RESOURCE_TIMING_BUFFER_SIZE;
use crate::lifecycle::{LifeCycle, LifeCycleEvent, LifeCycleEventKind, PerformanceEntry, ResourceTiming, Subscription};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

/// Resource entries recorded in arrival order
pub struct ResourceTimingBuffer {
    entries: RefCell<VecDeque<ResourceTiming>>,
    capacity: usize,
}

impl ResourceTimingBuffer {
    pub fn new() -> Self {
        Self::with_capacity(RESOURCE_TIMING_BUFFER_SIZE)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: RefCell::new(VecDeque::with_capacity(capacity.min(RESOURCE_TIMING_BUFFER_SIZE))),
            capacity: capacity.max(1),
        }
    }

    /// Record every resource entry collected on the bus
    pub fn attach(self: &Rc<Self>, lifecycle: &LifeCycle) -> Subscription {
        let buffer = Rc::clone(self);
        lifecycle.subscribe(LifeCycleEventKind::PerformanceEntryCollected, move |event| {
            if let LifeCycleEvent::PerformanceEntryCollected(PerformanceEntry::Resource(timing)) = event {
                buffer.record(timing.clone());
            }
        })
    }

    pub fn record(&self, timing: ResourceTiming) {
        let mut entries = self.entries.borrow_mut();
        if entries.len() == self.capacity {
            entries.pop_front();
        }
        entries.push_back(timing);
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}

impl Default for ResourceTimingBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl PerformanceTimeline for ResourceTimingBuffer {
    fn resource_entries_by_name(&self, url: &str) -> Vec<ResourceTiming> {
        self.entries
            .borrow()
            .iter()
            .filter(|entry| entry.name == url)
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn timing(name: &str) -> ResourceTiming {
        ResourceTiming {
            name: name.to_string(),
            ..ResourceTiming::default()
        }
    }

    #[test]
    fn test_lookup_by_name() {
        let buffer = ResourceTimingBuffer::new();
        buffer.record(timing("https://a.example/x"));
        buffer.record(timing("https://b.example/y"));
        buffer.record(timing("https://a.example/x"));

        assert_eq!(buffer.resource_entries_by_name("https://a.example/x").len(), 2);
        assert!(buffer.resource_entries_by_name("https://c.example/").is_empty());
    }

    #[test]
    fn test_oldest_entries_evicted() {
        let buffer = ResourceTimingBuffer::with_capacity(2);
        buffer.record(timing("first"));
        buffer.record(timing("second"));
        buffer.record(timing("third"));

        assert_eq!(buffer.len(), 2);
        assert!(buffer.resource_entries_by_name("first").is_empty());
    }

    #[test]
    fn test_attach_records_resource_entries() {
        let lifecycle = LifeCycle::new();
        let buffer = Rc::new(ResourceTimingBuffer::new());
        let _subscription = buffer.attach(&lifecycle);

        lifecycle.notify(LifeCycleEvent::PerformanceEntryCollected(PerformanceEntry::Resource(timing(
            "https://cdn.example/app.js",
        ))));
        lifecycle.notify(LifeCycleEvent::DomMutated);

        assert_eq!(buffer.len(), 1);
    }
}
