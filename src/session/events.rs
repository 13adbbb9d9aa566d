//! Events pushed from the session core to the presentation layer.
//!
//! The core never touches a display surface; everything a frontend shows
//! arrives through this stream.

use crate::protocol::InboundEvent;
use chrono::{DateTime, Local};

/// One timestamped line for the presentation log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub timestamp: DateTime<Local>,
    pub text: String,
}

impl LogEntry {
    /// Entry stamped with the current local time.
    pub fn now(text: impl Into<String>) -> Self {
        Self {
            timestamp: Local::now(),
            text: text.into(),
        }
    }
}

impl std::fmt::Display for LogEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{}] {}",
            self.timestamp.format("%Y-%m-%d %H:%M:%S"),
            self.text
        )
    }
}

/// Push stream consumed by the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// A decoded receive notification.
    Inbound(InboundEvent),
    /// A timestamped status line.
    Log(LogEntry),
    /// An inbound frame finished processing (repeater role). Hosts drive
    /// an LED or other indicator off this; no reply is expected.
    Processed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_entry_format() {
        let entry = LogEntry::now("beacon sent");
        let rendered = entry.to_string();
        assert!(rendered.starts_with('['));
        assert!(rendered.ends_with("] beacon sent"));
    }
}
