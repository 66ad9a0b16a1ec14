//! Per-partner topic tracking.
//!
//! Keeping one topic per partner stops the engine from confusing
//! conversational contexts when it talks with several people at once.
//! The map grows with the number of distinct partners seen, which is
//! acceptable for a long-lived conversational process.

use std::collections::HashMap;

/// Tracks the current conversational topic for each partner.
#[derive(Debug, Default)]
pub(crate) struct TopicTracker {
    topics: HashMap<String, String>,
}

impl TopicTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// The current topic for `partner`; empty if none was ever recorded.
    pub fn current(&self, partner: &str) -> &str {
        self.topics.get(partner).map_or("", String::as_str)
    }

    /// Records `label` as the current topic for `partner`.
    ///
    /// An empty label is an explicit no-op, not a reset: a rule with no
    /// topic side effect leaves the tracked topic alone.
    pub fn record(&mut self, partner: &str, label: &str) {
        if label.is_empty() {
            return;
        }
        self.topics.insert(partner.to_string(), label.to_string());
    }

    pub fn clear(&mut self) {
        self.topics.clear();
    }
}
