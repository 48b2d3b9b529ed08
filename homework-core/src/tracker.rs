//! Change tracking
//!
//! Remembers the last message sent per subject so the same state is only
//! reported once.

use std::collections::HashMap;

/// De-duplication scope
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Subject {
    /// Status messages for one homework, keyed by its name
    Homework(String),

    /// Failure reports of the polling loop itself
    Error,
}

impl Subject {
    pub fn homework(name: impl Into<String>) -> Self {
        Subject::Homework(name.into())
    }
}

impl std::fmt::Display for Subject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Subject::Homework(name) => write!(f, "{}", name),
            Subject::Error => write!(f, "error"),
        }
    }
}

/// In-memory last-sent state
///
/// Lives as long as the process; nothing is persisted.
#[derive(Debug, Default)]
pub struct ChangeTracker {
    last_sent: HashMap<Subject, String>,
}

impl ChangeTracker {
    /// Creates an empty tracker
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` when `message` differs from the last one recorded for `subject`
    pub fn should_notify(&self, subject: &Subject, message: &str) -> bool {
        self.last_sent
            .get(subject)
            .is_none_or(|last| last != message)
    }

    /// Records `message` as the last one sent for `subject`
    pub fn record(&mut self, subject: Subject, message: impl Into<String>) {
        self.last_sent.insert(subject, message.into());
    }

    /// Forgets the last message sent for `subject`
    pub fn clear(&mut self, subject: &Subject) {
        self.last_sent.remove(subject);
    }

    /// Last message recorded for `subject`, if any
    pub fn last_sent(&self, subject: &Subject) -> Option<&str> {
        self.last_sent.get(subject).map(String::as_str)
    }
}
