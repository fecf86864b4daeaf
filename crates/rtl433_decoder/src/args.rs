use std::fmt;

use serde::Deserialize;

/// Flags passed on every launch: JSON output, UTC timestamps, the newer model
/// naming scheme and signal level reporting.
pub const BASE_ARGS: [&str; 8] = ["-F", "json", "-M", "utc", "-M", "newmodel", "-M", "level"];

/// A scalar option value, passed to the decoder as text.
///
/// Configuration files may spell gain or frequency as numbers (`40`, `433.92`)
/// or as decoder shorthand (`"433.92M"`, `"250k"`).
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ArgValue {
    Integer(i64),
    Float(f64),
    Text(String),
}

impl fmt::Display for ArgValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgValue::Integer(v) => write!(f, "{v}"),
            ArgValue::Float(v) => write!(f, "{v}"),
            ArgValue::Text(v) => f.write_str(v),
        }
    }
}

impl From<&str> for ArgValue {
    fn from(value: &str) -> Self {
        ArgValue::Text(value.to_string())
    }
}

impl From<i64> for ArgValue {
    fn from(value: i64) -> Self {
        ArgValue::Integer(value)
    }
}

impl From<f64> for ArgValue {
    fn from(value: f64) -> Self {
        ArgValue::Float(value)
    }
}

/// Radio settings from the `rtlsdr` configuration section. Every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RtlSdrOptions {
    #[serde(default)]
    pub gain: Option<ArgValue>,
    #[serde(default)]
    pub device_serial: Option<ArgValue>,
    #[serde(default)]
    pub device_index: Option<u32>,
    #[serde(default)]
    pub frequency: Option<ArgValue>,
    #[serde(default)]
    pub sample_rate: Option<ArgValue>,
}

/// Decoder command line derived from [`RtlSdrOptions`].
#[derive(Debug, Clone, Default)]
pub struct DecoderArgs {
    pub(crate) options: Option<RtlSdrOptions>,
}

impl DecoderArgs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn options(mut self, options: RtlSdrOptions) -> Self {
        self.options = Some(options);
        self
    }

    /// Builds the argument vector.
    ///
    /// `-d` takes the serial form (`:<serial>`) when a serial is configured and
    /// only falls back to the index otherwise.
    pub fn argv(&self) -> Vec<String> {
        let mut out: Vec<String> = BASE_ARGS.iter().map(|arg| arg.to_string()).collect();

        if let Some(options) = self.options.as_ref() {
            if let Some(gain) = options.gain.as_ref() {
                out.push("-g".to_string());
                out.push(gain.to_string());
            }

            if let Some(serial) = options.device_serial.as_ref() {
                out.push("-d".to_string());
                out.push(format!(":{serial}"));
            } else if let Some(index) = options.device_index {
                out.push("-d".to_string());
                out.push(index.to_string());
            }

            if let Some(frequency) = options.frequency.as_ref() {
                out.push("-f".to_string());
                out.push(frequency.to_string());
            }

            if let Some(sample_rate) = options.sample_rate.as_ref() {
                out.push("-s".to_string());
                out.push(sample_rate.to_string());
            }
        }

        out
    }
}
