use std::collections::BTreeMap;
use std::fmt;

use serde_json::{json, Map, Value};
use time::{format_description::well_known::Rfc3339, OffsetDateTime};

/// One timestamped measurement. Built once, written once.
#[derive(Debug, Clone, PartialEq)]
pub struct Point {
    measurement: String,
    timestamp: OffsetDateTime,
    tags: BTreeMap<String, Option<String>>,
    fields: Map<String, Value>,
}

impl Point {
    pub fn new(
        measurement: impl Into<String>,
        timestamp: OffsetDateTime,
        tags: BTreeMap<String, Option<String>>,
        fields: Map<String, Value>,
    ) -> Self {
        Self {
            measurement: measurement.into(),
            timestamp,
            tags,
            fields,
        }
    }

    /// Same as [`Point::new`] stamped with the current UTC wall-clock time.
    pub fn now(
        measurement: impl Into<String>,
        tags: BTreeMap<String, Option<String>>,
        fields: Map<String, Value>,
    ) -> Self {
        Self::new(measurement, OffsetDateTime::now_utc(), tags, fields)
    }

    pub fn measurement(&self) -> &str {
        &self.measurement
    }

    pub fn timestamp(&self) -> OffsetDateTime {
        self.timestamp
    }

    /// Tags, including explicitly unset ones (`None`).
    pub fn tags(&self) -> &BTreeMap<String, Option<String>> {
        &self.tags
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn timestamp_nanos(&self) -> i128 {
        self.timestamp.unix_timestamp_nanos()
    }

    /// JSON view with an ISO-8601 timestamp, used for logging dropped points.
    pub fn to_json(&self) -> Value {
        let time = self
            .timestamp
            .format(&Rfc3339)
            .unwrap_or_else(|_| self.timestamp.to_string());
        json!({
            "measurement": self.measurement,
            "time": time,
            "tags": self.tags,
            "fields": self.fields,
        })
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_json())
    }
}
