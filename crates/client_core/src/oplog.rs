//! Operator-visible, bounded, append-only log.

use std::{
    collections::VecDeque,
    sync::{Mutex, MutexGuard, PoisonError},
};

use chrono::{DateTime, Local};
use serde::Serialize;
use tokio::sync::broadcast;

use crate::ConsoleEvent;

pub const LOG_CAPACITY: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Success,
    Error,
}

impl Severity {
    pub fn as_css_class(self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Success => "success",
            Severity::Error => "error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub recorded_at: DateTime<Local>,
    /// Wall-clock `HH:MM:SS`, the form operators read.
    pub timestamp: String,
    pub message: String,
    pub severity: Severity,
}

impl LogEntry {
    fn now(message: String, severity: Severity) -> Self {
        let recorded_at = Local::now();
        Self {
            timestamp: recorded_at.format("%H:%M:%S").to_string(),
            recorded_at,
            message,
            severity,
        }
    }

    pub fn render(&self) -> String {
        format!("[{}] {}", self.timestamp, self.message)
    }
}

/// Oldest entry first; the newest is always the tail, which is where a
/// viewer stays scrolled to.
pub struct OperationLog {
    entries: Mutex<VecDeque<LogEntry>>,
    capacity: usize,
    events: broadcast::Sender<ConsoleEvent>,
}

impl OperationLog {
    pub fn new(capacity: usize, events: broadcast::Sender<ConsoleEvent>) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
            events,
        }
    }

    fn entries_guard(&self) -> MutexGuard<'_, VecDeque<LogEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn append(&self, message: impl Into<String>, severity: Severity) -> LogEntry {
        let entry = LogEntry::now(message.into(), severity);
        {
            let mut entries = self.entries_guard();
            while entries.len() >= self.capacity {
                entries.pop_front();
            }
            entries.push_back(entry.clone());
        }
        let _ = self.events.send(ConsoleEvent::LogAppended(entry.clone()));
        entry
    }

    pub fn info(&self, message: impl Into<String>) -> LogEntry {
        self.append(message, Severity::Info)
    }

    pub fn success(&self, message: impl Into<String>) -> LogEntry {
        self.append(message, Severity::Success)
    }

    pub fn error(&self, message: impl Into<String>) -> LogEntry {
        self.append(message, Severity::Error)
    }

    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries_guard().iter().cloned().collect()
    }

    pub fn latest(&self) -> Option<LogEntry> {
        self.entries_guard().back().cloned()
    }

    pub fn len(&self) -> usize {
        self.entries_guard().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries_guard().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn log() -> OperationLog {
        let (events, _) = broadcast::channel(16);
        OperationLog::new(LOG_CAPACITY, events)
    }

    #[test]
    fn hundred_first_entry_evicts_exactly_the_oldest() {
        let log = log();
        for i in 0..LOG_CAPACITY {
            log.info(format!("entry {i}"));
        }
        assert_eq!(log.len(), LOG_CAPACITY);
        assert_eq!(log.entries()[0].message, "entry 0");

        log.error("entry 100");
        let entries = log.entries();
        assert_eq!(entries.len(), LOG_CAPACITY);
        assert_eq!(entries[0].message, "entry 1");
        assert_eq!(entries[LOG_CAPACITY - 1].message, "entry 100");
        assert_eq!(log.latest().map(|e| e.severity), Some(Severity::Error));
    }

    #[test]
    fn identical_messages_are_not_deduplicated() {
        let log = log();
        log.success("done");
        log.success("done");
        assert_eq!(log.len(), 2);
    }

    #[test]
    fn entries_render_with_clock_timestamp() {
        let entry = log().info("hello");
        assert_eq!(entry.timestamp.len(), 8);
        assert_eq!(entry.render(), format!("[{}] hello", entry.timestamp));
    }

    #[tokio::test]
    async fn appends_are_published_on_the_event_bus() {
        let (events, mut rx) = broadcast::channel(16);
        let log = OperationLog::new(LOG_CAPACITY, events);
        log.success("Naloženih 2 behaviourjev");

        match rx.recv().await.expect("event") {
            ConsoleEvent::LogAppended(entry) => {
                assert_eq!(entry.message, "Naloženih 2 behaviourjev");
                assert_eq!(entry.severity, Severity::Success);
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }
}
