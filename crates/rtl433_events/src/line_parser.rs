use serde_json::{Map, Value};

use crate::error::{ErrorCode, LineError};

/// One decoded event. Keys vary by device model; there is no fixed schema.
pub type RawEvent = Map<String, Value>;

/// Stateless parser for newline-delimited decoder output.
#[derive(Debug, Clone, Default)]
pub struct EventLineParser;

impl EventLineParser {
    pub fn new() -> Self {
        Self
    }

    /// Decodes one line.
    ///
    /// Returns `Ok(None)` for blank lines, which the decoder may emit between
    /// events. Errors carry the offending line so callers can log it verbatim.
    pub fn parse_line(&self, line: &str) -> Result<Option<RawEvent>, LineError> {
        let line = line.strip_suffix('\r').unwrap_or(line);
        if line.chars().all(|ch| ch.is_whitespace()) {
            return Ok(None);
        }

        let value: Value = serde_json::from_str(line)
            .map_err(|err| LineError::new(ErrorCode::JsonParse, err.to_string(), line))?;

        match value {
            Value::Object(map) => Ok(Some(map)),
            other => Err(LineError::new(
                ErrorCode::Convert,
                format!("expected a JSON object, got {}", json_kind(&other)),
                line,
            )),
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
