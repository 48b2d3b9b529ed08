//! Homework domain model
//!
//! Represents the review state of a submitted homework as reported by the
//! status API.

use serde_json::Value as JsonValue;
use std::str::FromStr;

/// Review outcome of a homework submission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verdict {
    /// Reviewer accepted the work
    Approved,

    /// Work is being reviewed
    Reviewing,

    /// Reviewer left remarks
    Rejected,
}

impl Verdict {
    /// All verdicts the status API is known to report
    pub const ALL: [Verdict; 3] = [Verdict::Approved, Verdict::Reviewing, Verdict::Rejected];

    /// Wire key used by the status API
    pub fn key(&self) -> &'static str {
        match self {
            Verdict::Approved => "approved",
            Verdict::Reviewing => "reviewing",
            Verdict::Rejected => "rejected",
        }
    }

    /// Human-readable text sent to the user
    pub fn text(&self) -> &'static str {
        match self {
            Verdict::Approved => "Работа проверена: ревьюеру всё понравилось. Ура!",
            Verdict::Reviewing => "Работа взята на проверку ревьюером.",
            Verdict::Rejected => "Работа проверена: у ревьюера есть замечания.",
        }
    }
}

impl FromStr for Verdict {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Verdict::ALL
            .into_iter()
            .find(|verdict| verdict.key() == s)
            .ok_or_else(|| s.to_string())
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

/// A single homework and its current verdict
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HomeworkRecord {
    /// Homework name, used as the de-duplication subject
    pub name: String,

    /// Current review verdict
    pub status: Verdict,
}

/// Result of one fetch after shape validation
///
/// Individual homework entries are kept as raw JSON: they are checked one by
/// one when turned into messages, so a malformed entry can be handled
/// according to the configured failure policy.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusSnapshot {
    /// Homework entries in the order the API returned them
    pub homeworks: Vec<JsonValue>,

    /// Server-side timestamp usable as the next `from_date`
    pub current_date: i64,
}
