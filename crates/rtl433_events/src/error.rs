use thiserror::Error;

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum ErrorCode {
    /// The line is not valid JSON.
    JsonParse,
    /// The line is valid JSON but not an object.
    Convert,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::JsonParse => "json_parse",
            ErrorCode::Convert => "convert",
        }
    }
}

/// A per-line failure. Never fatal to the stream that produced the line.
#[derive(Debug, Clone, Error)]
#[error("unable to decode line ({}): {summary}", .code.as_str())]
pub struct LineError {
    pub code: ErrorCode,
    pub summary: String,
    pub line: String,
}

impl LineError {
    pub(crate) fn new(code: ErrorCode, summary: impl Into<String>, line: &str) -> Self {
        Self {
            code,
            summary: summary.into(),
            line: line.to_string(),
        }
    }

    pub fn code(&self) -> ErrorCode {
        self.code
    }

    pub fn redacted_summary(&self) -> &str {
        &self.summary
    }

    /// Summary plus the offending line, for operator diagnosis.
    pub fn full_details(&self) -> String {
        format!("{}: {}", self.summary, self.line)
    }
}
