use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::RawEvent;

/// Identity keys that always appear in a record's tags, present or not.
pub const TAG_KEYS: [&str; 5] = ["brand", "OS", "model", "id", "channel"];

/// The decoder's self-reported timestamp. Dropped in favour of wall-clock time.
pub const TIME_KEY: &str = "time";

/// Operator-configured tags merged into every record.
pub type StaticTags = BTreeMap<String, String>;

/// A tag value that may be explicitly unset.
#[derive(Debug, Clone, Eq, PartialEq, Ord, PartialOrd)]
pub enum TagValue {
    Present(String),
    Absent,
}

impl TagValue {
    pub fn is_absent(&self) -> bool {
        matches!(self, TagValue::Absent)
    }

    pub fn into_option(self) -> Option<String> {
        match self {
            TagValue::Present(value) => Some(value),
            TagValue::Absent => None,
        }
    }

    fn from_json(value: Value) -> Self {
        match value {
            Value::Null => TagValue::Absent,
            Value::String(s) => TagValue::Present(s),
            other => TagValue::Present(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizedRecord {
    pub tags: BTreeMap<String, TagValue>,
    pub fields: Map<String, Value>,
}

/// Splits a raw event into tags and fields.
///
/// `time` is removed, every key in [`TAG_KEYS`] is moved into the tags (as
/// [`TagValue::Absent`] when missing), and whatever remains becomes a field
/// untouched. Static tags are applied last and win over extracted ones.
pub fn normalize(mut raw: RawEvent, static_tags: Option<&StaticTags>) -> NormalizedRecord {
    raw.remove(TIME_KEY);

    let mut tags = BTreeMap::new();
    for key in TAG_KEYS {
        let value = raw
            .remove(key)
            .map(TagValue::from_json)
            .unwrap_or(TagValue::Absent);
        tags.insert(key.to_string(), value);
    }

    if let Some(static_tags) = static_tags {
        for (key, value) in static_tags {
            // A static tag may shadow a non-identity key; keep the partition.
            raw.remove(key);
            tags.insert(key.clone(), TagValue::Present(value.clone()));
        }
    }

    NormalizedRecord { tags, fields: raw }
}
