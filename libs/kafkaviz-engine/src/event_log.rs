use std::collections::VecDeque;

use serde::Serialize;

use crate::record::now_ms;

/// Default number of retained activity entries.
pub const DEFAULT_EVENT_LOG_CAPACITY: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Info,
    Success,
    Warning,
    Error,
}

/// One human-readable activity entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Event {
    pub id: u64,
    pub ts_ms: i64,
    pub kind: EventKind,
    pub text: String,
}

/// Bounded activity log. Observational only; dropping entries past the
/// bound never affects simulation state.
#[derive(Debug, Clone)]
pub struct EventLog {
    entries: VecDeque<Event>,
    capacity: usize,
    next_id: u64,
}

impl EventLog {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
            next_id: 0,
        }
    }

    pub fn push(&mut self, kind: EventKind, text: impl Into<String>) {
        let event = Event {
            id: self.next_id,
            ts_ms: now_ms(),
            kind,
            text: text.into(),
        };
        self.next_id += 1;
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(event);
    }

    pub fn info(&mut self, text: impl Into<String>) {
        self.push(EventKind::Info, text);
    }

    pub fn success(&mut self, text: impl Into<String>) {
        self.push(EventKind::Success, text);
    }

    pub fn warning(&mut self, text: impl Into<String>) {
        self.push(EventKind::Warning, text);
    }

    pub fn error(&mut self, text: impl Into<String>) {
        self.push(EventKind::Error, text);
    }

    /// Entries, newest first.
    pub fn recent(&self) -> Vec<Event> {
        self.entries.iter().rev().cloned().collect()
    }

    pub fn latest(&self) -> Option<&Event> {
        self.entries.back()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl Default for EventLog {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_LOG_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn oldest_entries_fall_off() {
        let mut log = EventLog::new(3);
        for i in 0..5 {
            log.info(format!("event {i}"));
        }
        let texts: Vec<String> = log.recent().into_iter().map(|e| e.text).collect();
        assert_eq!(texts, vec!["event 4", "event 3", "event 2"]);
    }

    #[test]
    fn ids_keep_increasing_across_truncation_and_clear() {
        let mut log = EventLog::new(1);
        log.info("a");
        log.warning("b");
        assert_eq!(log.latest().map(|e| e.id), Some(1));
        log.clear();
        assert!(log.is_empty());
        log.error("c");
        assert_eq!(log.latest().map(|e| (e.id, e.kind)), Some((2, EventKind::Error)));
    }
}
