//! InfluxDB Line Protocol encoding.
//!
//! ```text
//! measurement,tag1=val1,tag2=val2 field1=val1,field2=val2 timestamp_ns
//! ```
//!
//! See: <https://docs.influxdata.com/influxdb/v1/write_protocols/line_protocol_reference/>

use std::fmt;

use serde_json::Value;

use crate::{Point, StoreError};

/// A value that can be stored in an InfluxDB field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Float(f64),
    Integer(i64),
    String(String),
    Boolean(bool),
}

impl FieldValue {
    /// Maps a JSON value onto a field type.
    ///
    /// `null` has no representation and yields `None`. Arrays and objects are
    /// kept as their JSON text.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Null => None,
            Value::Bool(v) => Some(FieldValue::Boolean(*v)),
            Value::Number(n) => match n.as_i64() {
                Some(v) => Some(FieldValue::Integer(v)),
                None => n.as_f64().map(FieldValue::Float),
            },
            Value::String(s) => Some(FieldValue::String(s.clone())),
            Value::Array(_) | Value::Object(_) => Some(FieldValue::String(value.to_string())),
        }
    }

    /// - Float: written as-is (e.g., `3.14`)
    /// - Integer: suffixed with `i` (e.g., `42i`)
    /// - String: quoted, inner quotes and backslashes escaped
    /// - Boolean: `true` or `false`
    pub fn to_line_protocol(&self) -> String {
        match self {
            FieldValue::Float(v) => format!("{}", v),
            FieldValue::Integer(v) => format!("{}i", v),
            FieldValue::String(v) => {
                let escaped = v.replace('\\', "\\\\").replace('"', "\\\"");
                format!("\"{}\"", escaped)
            }
            FieldValue::Boolean(v) => v.to_string(),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_line_protocol())
    }
}

/// Encodes a point as a single Line Protocol line.
///
/// Unset or empty tags are left out since the protocol has no empty tag
/// value. Fails when no field survives encoding.
pub fn encode_point(point: &Point) -> Result<String, StoreError> {
    let mut fields = Vec::with_capacity(point.fields().len());
    for (key, value) in point.fields() {
        let Some(value) = FieldValue::from_json(value) else {
            continue;
        };
        if let FieldValue::Float(v) = value {
            if !v.is_finite() {
                continue;
            }
        }
        let key = escape_key(key);
        if key.is_empty() {
            continue;
        }
        fields.push(format!("{}={}", key, value.to_line_protocol()));
    }

    if fields.is_empty() {
        return Err(StoreError::Encode(
            "InfluxDB requires at least one field".to_string(),
        ));
    }

    let mut line = escape_measurement(point.measurement());

    // BTreeMap iteration keeps tags sorted by key, the canonical form.
    for (key, value) in point.tags() {
        let (key, value) = match value.as_deref() {
            Some(value) => (escape_key(key), escape_key(value)),
            None => continue,
        };
        if key.is_empty() || value.is_empty() {
            continue;
        }
        line.push(',');
        line.push_str(&key);
        line.push('=');
        line.push_str(&value);
    }

    line.push(' ');
    line.push_str(&fields.join(","));
    line.push(' ');
    line.push_str(&point.timestamp_nanos().to_string());

    Ok(line)
}

/// Spaces and commas must be escaped with backslash.
fn escape_measurement(s: &str) -> String {
    single_line(s).replace(',', "\\,").replace(' ', "\\ ")
}

/// Tag keys, tag values and field keys share one escaping rule.
fn escape_key(s: &str) -> String {
    single_line(s)
        .replace(',', "\\,")
        .replace('=', "\\=")
        .replace(' ', "\\ ")
}

/// Line breaks end a point, so they are written as a literal `\n`. A trailing
/// backslash would escape the separator that follows and is dropped.
fn single_line(s: &str) -> String {
    s.replace("\r\n", "\\n")
        .replace(['\n', '\r'], "\\n")
        .trim_end_matches('\\')
        .to_string()
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use serde_json::{json, Map};
    use time::OffsetDateTime;

    use super::*;

    fn point(tags: &[(&str, Option<&str>)], fields: Value) -> Point {
        let tags: BTreeMap<String, Option<String>> = tags
            .iter()
            .map(|(k, v)| (k.to_string(), v.map(str::to_string)))
            .collect();
        let fields: Map<String, Value> = match fields {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        let timestamp = OffsetDateTime::from_unix_timestamp(1).unwrap();
        Point::new("rtl433", timestamp, tags, fields)
    }

    #[test]
    fn test_field_value_types() {
        assert_eq!(FieldValue::Float(3.15).to_line_protocol(), "3.15");
        assert_eq!(FieldValue::Integer(42).to_line_protocol(), "42i");
        assert_eq!(FieldValue::Boolean(false).to_line_protocol(), "false");
        assert_eq!(
            FieldValue::String("say \"hi\"".to_string()).to_line_protocol(),
            "\"say \\\"hi\\\"\""
        );
    }

    #[test]
    fn test_field_value_from_json() {
        assert_eq!(FieldValue::from_json(&json!(1)), Some(FieldValue::Integer(1)));
        assert_eq!(FieldValue::from_json(&json!(1.5)), Some(FieldValue::Float(1.5)));
        assert_eq!(FieldValue::from_json(&json!(null)), None);
        assert_eq!(
            FieldValue::from_json(&json!([1, 2])),
            Some(FieldValue::String("[1,2]".to_string()))
        );
    }

    #[test]
    fn test_point_with_absent_tags() {
        let p = point(
            &[("model", Some("Nexus-TH")), ("brand", None), ("id", Some("7"))],
            json!({"humidity": 55, "temperature_C": 20.5}),
        );
        assert_eq!(
            encode_point(&p).unwrap(),
            "rtl433,id=7,model=Nexus-TH humidity=55i,temperature_C=20.5 1000000000"
        );
    }

    #[test]
    fn test_escape_special_chars() {
        let p = point(
            &[("model", Some("Oregon Scientific,v2"))],
            json!({"field=key": "hello \"world\""}),
        );
        assert_eq!(
            encode_point(&p).unwrap(),
            "rtl433,model=Oregon\\ Scientific\\,v2 field\\=key=\"hello \\\"world\\\"\" 1000000000"
        );
    }

    #[test]
    fn test_point_without_fields_is_rejected() {
        let p = point(&[("model", Some("x"))], json!({"nothing": null}));
        assert!(matches!(encode_point(&p), Err(StoreError::Encode(_))));
    }

    #[test]
    fn test_trailing_backslash_cannot_escape_separator() {
        let p = point(&[("model", Some("X\\"))], json!({"path\\": 1}));
        assert_eq!(
            encode_point(&p).unwrap(),
            "rtl433,model=X path=1i 1000000000"
        );
    }

    #[test]
    fn test_newlines_in_tags_and_keys_stay_on_one_line() {
        let p = point(&[("model", Some("two\nlines"))], json!({"a\r\nb": 2.5}));
        let line = encode_point(&p).unwrap();
        assert_eq!(line, "rtl433,model=two\\nlines a\\nb=2.5 1000000000");
        assert_eq!(line.lines().count(), 1);
    }

    #[test]
    fn test_tag_reduced_to_nothing_is_omitted() {
        let p = point(&[("model", Some("\\")), ("id", Some("1"))], json!({"x": 1}));
        assert_eq!(encode_point(&p).unwrap(), "rtl433,id=1 x=1i 1000000000");
    }
}
