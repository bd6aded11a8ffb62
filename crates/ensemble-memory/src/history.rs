//! Rolling prompt history.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One recorded prompt and when it was recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptRecord {
    pub prompt: String,
    pub recorded_at: DateTime<Utc>,
}

/// Fixed-capacity ring buffer of recent prompts, most-recent-last.
/// Insertion beyond capacity evicts the oldest entry.
#[derive(Debug)]
pub(crate) struct PromptHistory {
    entries: VecDeque<PromptRecord>,
    capacity: usize,
}

impl PromptHistory {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub(crate) fn record(&mut self, prompt: &str) {
        if self.capacity == 0 {
            return;
        }
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(PromptRecord {
            prompt: prompt.to_string(),
            recorded_at: Utc::now(),
        });
    }

    /// Defensive copy, oldest first.
    pub(crate) fn snapshot(&self) -> Vec<PromptRecord> {
        self.entries.iter().cloned().collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}
