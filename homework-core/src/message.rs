//! Status messages
//!
//! Turns one raw homework entry into the text sent to the user.

use serde_json::Value as JsonValue;
use thiserror::Error;

use crate::domain::homework::{HomeworkRecord, Verdict};

/// Key holding the homework name in the status API
pub const NAME_KEY: &str = "homework_name";

/// Shorter name key accepted as a fallback
pub const NAME_FALLBACK_KEY: &str = "name";

/// Key holding the verdict
pub const STATUS_KEY: &str = "status";

/// Ways a single homework entry can be rejected
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("запись о домашней работе не является словарём")]
    NotAnObject,

    #[error("нет обязательного поля {0}")]
    MissingField(&'static str),

    #[error("недокументированный статус домашней работы: {0}")]
    UnknownVerdict(String),
}

/// A parsed homework entry together with its notification text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusUpdate {
    pub record: HomeworkRecord,
    pub message: String,
}

impl StatusUpdate {
    /// Builds the notification text for a record
    pub fn new(record: HomeworkRecord) -> Self {
        let message = format!(
            "Изменился статус проверки работы \"{}\". {}",
            record.name,
            record.status.text()
        );
        Self { record, message }
    }
}

/// Parses one homework entry into a status update
///
/// The verdict is checked before the name, so an entry with an unknown
/// verdict is reported as such even when its name is missing too.
pub fn parse_status(homework: &JsonValue) -> Result<StatusUpdate, ParseError> {
    let object = homework.as_object().ok_or(ParseError::NotAnObject)?;

    let status = object
        .get(STATUS_KEY)
        .ok_or(ParseError::MissingField(STATUS_KEY))?;
    let status = match status.as_str() {
        Some(key) => key.parse::<Verdict>().map_err(ParseError::UnknownVerdict)?,
        None => return Err(ParseError::UnknownVerdict(status.to_string())),
    };

    let name = object
        .get(NAME_KEY)
        .or_else(|| object.get(NAME_FALLBACK_KEY))
        .and_then(JsonValue::as_str)
        .filter(|name| !name.is_empty())
        .ok_or(ParseError::MissingField(NAME_KEY))?;

    Ok(StatusUpdate::new(HomeworkRecord {
        name: name.to_string(),
        status,
    }))
}
