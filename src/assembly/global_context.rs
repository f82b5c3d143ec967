/*!
 * Global Context
 * Host-supplied attributes attached to every assembled event
 */

use crate::core::types::Context;
use serde_json::Value;
use std::cell::RefCell;

/// Live global context; readers only ever get deep copies
#[derive(Debug, Default)]
pub struct GlobalContext {
    context: RefCell<Context>,
}

impl GlobalContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole context
    pub fn set(&self, context: Context) {
        *self.context.borrow_mut() = context;
    }

    pub fn add_property(&self, key: impl Into<String>, value: Value) {
        self.context.borrow_mut().insert(key.into(), value);
    }

    pub fn remove_property(&self, key: &str) {
        self.context.borrow_mut().remove(key);
    }

    /// Deep copy of the current context
    pub fn snapshot(&self) -> Context {
        self.context.borrow().clone()
    }
}
