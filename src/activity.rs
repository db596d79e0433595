use std::collections::VecDeque;

use chrono::{DateTime, Local};

/// Entries kept in the in-app activity log.
pub const LOG_CAPACITY: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone)]
pub struct Entry {
    pub at: DateTime<Local>,
    pub severity: Severity,
    pub message: String,
}

impl Entry {
    pub fn timestamp(&self) -> String {
        self.at.format("%H:%M:%S").to_string()
    }
}

/// Bounded, newest-last log of user-visible events.
/// When full, pushing a new entry drops the oldest one.
#[derive(Clone, Debug)]
pub struct ActivityLog {
    buf: VecDeque<Entry>,
    capacity: usize,
}

impl Default for ActivityLog {
    fn default() -> Self {
        Self::new(LOG_CAPACITY)
    }
}

impl ActivityLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            buf: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
        }
    }

    pub fn push(&mut self, severity: Severity, message: impl Into<String>) {
        if self.buf.len() >= self.capacity {
            self.buf.pop_front();
        }
        self.buf.push_back(Entry {
            at: Local::now(),
            severity,
            message: message.into(),
        });
    }

    pub fn info(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::info!("{message}");
        self.push(Severity::Info, message);
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!("{message}");
        self.push(Severity::Warning, message);
    }

    pub fn error(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::error!("{message}");
        self.push(Severity::Error, message);
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Entry> {
        self.buf.iter()
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_activity_log_capacity() {
        let mut log = ActivityLog::new(3);
        for i in 1..=4 {
            log.info(format!("event {i}"));
        }
        assert_eq!(log.len(), 3);
        let items: Vec<_> = log.iter().map(|e| e.message.as_str()).collect();
        assert_eq!(items, vec!["event 2", "event 3", "event 4"]);
    }

    #[test]
    fn test_activity_log_empty() {
        let log = ActivityLog::default();
        assert!(log.is_empty());
        assert!(log.iter().next_back().is_none());
    }

    #[test]
    fn test_severity_recorded() {
        let mut log = ActivityLog::default();
        log.warn("careful");
        log.error("broken");
        let newest = log.iter().next_back().unwrap();
        assert_eq!(newest.severity, Severity::Error);
        assert_eq!(newest.timestamp().len(), 8);
    }
}
