//! YAML configuration for the agent.

use std::path::{Path, PathBuf};

use influx_store::InfluxConfig;
use rtl433_decoder::RtlSdrOptions;
use rtl433_events::StaticTags;
use serde::{Deserialize, Deserializer};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unable to read config file `{path}`: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("unable to parse config file `{path}`: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

/// Top-level configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// InfluxDB connection settings.
    pub influxdb: InfluxConfig,
    /// Radio settings. Absent = decoder defaults.
    #[serde(default)]
    pub rtlsdr: Option<RtlSdrOptions>,
    /// Static tags added to every point.
    #[serde(default, deserialize_with = "scalar_tags")]
    pub tags: Option<StaticTags>,
}

impl AppConfig {
    pub fn from_yaml(yaml: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(yaml)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ScalarTag {
    Text(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
}

impl ScalarTag {
    fn into_string(self) -> String {
        match self {
            ScalarTag::Text(v) => v,
            ScalarTag::Integer(v) => v.to_string(),
            ScalarTag::Float(v) => v.to_string(),
            ScalarTag::Bool(v) => v.to_string(),
        }
    }
}

// Tag values are strings on the wire, but `floor: 2` should not be a parse error.
fn scalar_tags<'de, D>(deserializer: D) -> Result<Option<StaticTags>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<std::collections::BTreeMap<String, ScalarTag>> =
        Option::deserialize(deserializer)?;
    Ok(raw.map(|tags| {
        tags.into_iter()
            .map(|(key, value)| (key, value.into_string()))
            .collect()
    }))
}
