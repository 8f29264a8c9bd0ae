//! Combat log - append-only narration shown oldest-first in the message box

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::value_objects::LogEntryId;

/// How a log line is styled by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogKind {
    Info,
    Damage,
    Heal,
    Critical,
}

/// A single line of battle narration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub id: LogEntryId,
    pub text: String,
    pub kind: LogKind,
    pub at: DateTime<Utc>,
}

/// Append-only sequence of log entries. Ordering is chronological and is
/// also the display order; entries are never reordered or edited.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CombatLog {
    entries: Vec<LogEntry>,
}

impl CombatLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a line and return a copy for event fan-out.
    pub fn push(&mut self, text: impl Into<String>, kind: LogKind) -> LogEntry {
        let entry = LogEntry {
            id: LogEntryId::new(),
            text: text.into(),
            kind,
            at: Utc::now(),
        };
        self.entries.push(entry.clone());
        entry
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Wipe the log. Only called at session boundaries (new battle, reset);
    /// within a battle the log is strictly append-only.
    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_preserves_order() {
        let mut log = CombatLog::new();
        log.push("first", LogKind::Info);
        log.push("second", LogKind::Damage);
        log.push("third", LogKind::Critical);

        let texts: Vec<_> = log.entries().iter().map(|e| e.text.as_str()).collect();
        assert_eq!(texts, vec!["first", "second", "third"]);
    }

    #[test]
    fn length_is_monotonic_within_a_session() {
        let mut log = CombatLog::new();
        let mut last = 0;
        for i in 0..10 {
            log.push(format!("line {i}"), LogKind::Info);
            assert!(log.len() > last);
            last = log.len();
        }
    }

    #[test]
    fn ids_are_unique() {
        let mut log = CombatLog::new();
        let a = log.push("a", LogKind::Info);
        let b = log.push("b", LogKind::Info);
        assert_ne!(a.id, b.id);
    }
}
