/*!
 * Batch
 * Bounded buffer of newline-delimited JSON messages
 *
 * The buffer never holds more than `max_size` messages nor reaches
 * `bytes_limit` bytes (separators included): a message that would reach the
 * limit flushes the buffer first, and a buffer that becomes full is flushed
 * right away. Keyed messages are replaced in place until flushed.
 */

use super::http::HttpRequest;
use ahash::AHashMap;
use serde_json::Value;
use std::cell::RefCell;
use tracing::{trace, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchLimits {
    pub max_size: usize,
    pub bytes_limit: usize,
    pub max_message_size: usize,
}

#[derive(Default)]
struct BatchBuffer {
    messages: Vec<String>,
    /// Upsert key to position in `messages`
    keys: AHashMap<String, usize>,
    bytes: usize,
}

impl BatchBuffer {
    #[inline]
    fn separator(&self) -> usize {
        usize::from(!self.messages.is_empty())
    }

    fn push(&mut self, message: String, key: Option<&str>) {
        self.bytes += message.len() + self.separator();
        if let Some(key) = key {
            self.keys.insert(key.to_string(), self.messages.len());
        }
        self.messages.push(message);
    }

    fn remove(&mut self, key: &str) {
        let Some(position) = self.keys.remove(key) else {
            return;
        };
        let removed = self.messages.remove(position);
        self.bytes -= removed.len() + self.separator();
        for index in self.keys.values_mut() {
            if *index > position {
                *index -= 1;
            }
        }
    }

    fn take(&mut self) -> (String, usize) {
        let data = self.messages.join("\n");
        let bytes = self.bytes;
        *self = Self::default();
        (data, bytes)
    }
}

/// Message buffer flushing to one endpoint
pub struct Batch {
    request: HttpRequest,
    limits: BatchLimits,
    buffer: RefCell<BatchBuffer>,
}

impl Batch {
    pub fn new(request: HttpRequest, limits: BatchLimits) -> Self {
        Self {
            request,
            limits,
            buffer: RefCell::new(BatchBuffer::default()),
        }
    }

    pub fn add(&self, message: &Value) {
        self.add_or_update(message, None);
    }

    /// Add, replacing any unflushed message sharing `key` at its position
    pub fn upsert(&self, message: &Value, key: &str) {
        self.add_or_update(message, Some(key));
    }

    /// Send pending messages, if any
    pub fn flush(&self) {
        let (data, bytes) = {
            let mut buffer = self.buffer.borrow_mut();
            if buffer.messages.is_empty() {
                return;
            }
            buffer.take()
        };
        trace!(bytes, "flushing batch");
        self.request.send(data, bytes);
    }

    pub fn pending_count(&self) -> usize {
        self.buffer.borrow().messages.len()
    }

    pub fn pending_bytes(&self) -> usize {
        self.buffer.borrow().bytes
    }

    fn add_or_update(&self, message: &Value, key: Option<&str>) {
        let processed = match serde_json::to_string(message) {
            Ok(processed) => processed,
            Err(e) => {
                warn!(error = %e, "message could not be serialized, dropping it");
                return;
            }
        };
        let size = processed.len();
        if size >= self.limits.max_message_size {
            warn!(
                size,
                max_message_size = self.limits.max_message_size,
                "message too big, dropping it"
            );
            return;
        }

        let flush_first = {
            let mut buffer = self.buffer.borrow_mut();
            if let Some(position) = key.and_then(|key| buffer.keys.get(key).copied()) {
                let replaced_bytes = buffer.bytes - buffer.messages[position].len() + size;
                if replaced_bytes < self.limits.bytes_limit {
                    buffer.messages[position] = processed;
                    buffer.bytes = replaced_bytes;
                    return;
                }
                if let Some(key) = key {
                    buffer.remove(key);
                }
            }
            buffer.bytes + size + buffer.separator() >= self.limits.bytes_limit
        };

        if flush_first {
            self.flush();
        }

        let full = {
            let mut buffer = self.buffer.borrow_mut();
            buffer.push(processed, key);
            buffer.messages.len() >= self.limits.max_size || buffer.bytes >= self.limits.bytes_limit
        };

        if full {
            self.flush();
        }
    }
}
