use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use time::{macros::format_description, OffsetDateTime};

pub const TRADE_LOG_CAPACITY: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogKind {
    System,
    Buy,
    Sell,
    Error,
}

impl LogKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::System => "system",
            Self::Buy => "buy",
            Self::Sell => "sell",
            Self::Error => "error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp_ms: i64,
    pub kind: LogKind,
    pub message: String,
}

impl LogEntry {
    pub fn new(timestamp_ms: i64, kind: LogKind, message: impl Into<String>) -> Self {
        Self {
            timestamp_ms,
            kind,
            message: message.into(),
        }
    }

    /// Wall-clock `HH:MM:SS` in UTC, or `--:--:--` for an out-of-range stamp.
    pub fn time_label(&self) -> String {
        let nanos = i128::from(self.timestamp_ms) * 1_000_000;
        OffsetDateTime::from_unix_timestamp_nanos(nanos)
            .ok()
            .and_then(|at| {
                at.format(format_description!("[hour]:[minute]:[second]"))
                    .ok()
            })
            .unwrap_or_else(|| "--:--:--".to_owned())
    }
}

/// User-facing activity feed, newest entry first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TradeLog {
    entries: VecDeque<LogEntry>,
    capacity: usize,
}

impl Default for TradeLog {
    fn default() -> Self {
        Self::with_capacity(TRADE_LOG_CAPACITY)
    }
}

impl TradeLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        assert!(capacity > 0, "trade log capacity must be greater than zero");

        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, entry: LogEntry) {
        self.entries.push_front(entry);
        self.entries.truncate(self.capacity);
    }

    pub fn record(&mut self, timestamp_ms: i64, kind: LogKind, message: impl Into<String>) {
        self.push(LogEntry::new(timestamp_ms, kind, message));
    }

    pub fn entries(&self) -> impl ExactSizeIterator<Item = &LogEntry> {
        self.entries.iter()
    }

    pub fn latest(&self) -> Option<&LogEntry> {
        self.entries.front()
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
