/*!
 * Static Environment
 * Host environment backed by a fixed set of element ids
 */

use super::traits::HostEnvironment;
use ahash::HashSet;
use std::cell::RefCell;

#[derive(Debug, Default)]
pub struct StaticEnvironment {
    element_ids: RefCell<HashSet<String>>,
    synthetics: bool,
}

impl StaticEnvironment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_elements<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            element_ids: RefCell::new(ids.into_iter().map(Into::into).collect()),
            synthetics: false,
        }
    }

    pub fn with_synthetics(mut self, synthetics: bool) -> Self {
        self.synthetics = synthetics;
        self
    }

    /// Register an element id (e.g. a section rendered after boot)
    pub fn add_element(&self, id: impl Into<String>) {
        self.element_ids.borrow_mut().insert(id.into());
    }
}

impl HostEnvironment for StaticEnvironment {
    fn element_exists(&self, id: &str) -> bool {
        !id.is_empty() && self.element_ids.borrow().contains(id)
    }

    fn is_synthetics(&self) -> bool {
        self.synthetics
    }
}
