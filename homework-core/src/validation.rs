//! Response validation
//!
//! Checks a decoded status API body against the expected shape before the
//! rest of the bot trusts it.

use serde_json::Value as JsonValue;
use thiserror::Error;

use crate::domain::homework::StatusSnapshot;

/// Key holding the homework list
pub const HOMEWORKS_KEY: &str = "homeworks";

/// Key holding the server-side cursor
pub const CURRENT_DATE_KEY: &str = "current_date";

/// Ways a decoded response can fail validation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShapeError {
    #[error("пустой ответ API")]
    Empty,

    #[error("тип данных ответа не словарь: {0}")]
    NotAnObject(&'static str),

    #[error("в ответе API нет ожидаемых ключей: {}", .0.join(", "))]
    MissingKeys(Vec<&'static str>),

    #[error("тип данных homeworks не список: {0}")]
    HomeworksNotAList(&'static str),

    #[error("current_date не является целым числом: {0}")]
    InvalidCursor(String),
}

/// Validates a decoded response and extracts the snapshot
///
/// Fails when the body is empty, is not a JSON object, lacks either
/// `homeworks` or `current_date`, when `homeworks` is not an array, or when
/// `current_date` is not an integer.
pub fn check_response(response: &JsonValue) -> Result<StatusSnapshot, ShapeError> {
    if is_empty(response) {
        return Err(ShapeError::Empty);
    }

    let object = response
        .as_object()
        .ok_or(ShapeError::NotAnObject(type_name(response)))?;

    let missing: Vec<&'static str> = [HOMEWORKS_KEY, CURRENT_DATE_KEY]
        .into_iter()
        .filter(|key| !object.contains_key(*key))
        .collect();
    if !missing.is_empty() {
        return Err(ShapeError::MissingKeys(missing));
    }

    let homeworks = &object[HOMEWORKS_KEY];
    let homeworks = homeworks
        .as_array()
        .ok_or(ShapeError::HomeworksNotAList(type_name(homeworks)))?;

    let current_date = &object[CURRENT_DATE_KEY];
    let current_date = current_date
        .as_i64()
        .ok_or_else(|| ShapeError::InvalidCursor(current_date.to_string()))?;

    Ok(StatusSnapshot {
        homeworks: homeworks.clone(),
        current_date,
    })
}

fn is_empty(value: &JsonValue) -> bool {
    match value {
        JsonValue::Null => true,
        JsonValue::Object(map) => map.is_empty(),
        JsonValue::Array(items) => items.is_empty(),
        JsonValue::String(s) => s.is_empty(),
        _ => false,
    }
}

fn type_name(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "bool",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}
