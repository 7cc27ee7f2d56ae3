//! Bounded message buffer
//!
//! Messages are appended to a pending batch and moved into the retained store on
//! each flush tick. The retained store keeps the newest message first and drops
//! the oldest ones beyond `max_retained`.

use super::message::LogMessage;
use std::collections::VecDeque;

pub struct BoundedMessageBuffer {
    pending: Vec<LogMessage>,
    retained: VecDeque<LogMessage>,
    max_retained: usize,
}

impl BoundedMessageBuffer {
    pub fn new(max_retained: usize) -> Self {
        let max_retained = max_retained.max(1);
        Self {
            pending: Vec::new(),
            retained: VecDeque::with_capacity(max_retained),
            max_retained,
        }
    }

    /// Queue a message for the next flush
    pub fn append(&mut self, msg: LogMessage) {
        self.pending.push(msg);
    }

    /// Move the pending batch into the retained store
    ///
    /// Returns the flushed batch in arrival order.
    pub fn flush(&mut self) -> Vec<LogMessage> {
        if self.pending.is_empty() {
            return Vec::new();
        }
        let batch = std::mem::take(&mut self.pending);

        for msg in &batch {
            self.retained.push_front(msg.clone());
        }
        self.retained.truncate(self.max_retained);

        batch
    }

    /// Retained messages, newest first
    pub fn iter(&self) -> impl Iterator<Item = &LogMessage> {
        self.retained.iter()
    }

    pub fn get(&self, index: usize) -> Option<&LogMessage> {
        self.retained.get(index)
    }

    /// Drop everything, pending included
    pub fn clear(&mut self) {
        self.pending.clear();
        self.retained.clear();
    }

    /// Number of retained messages
    pub fn len(&self) -> usize {
        self.retained.len()
    }

    pub fn is_empty(&self) -> bool {
        self.retained.is_empty()
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn max_retained(&self) -> usize {
        self.max_retained
    }
}
