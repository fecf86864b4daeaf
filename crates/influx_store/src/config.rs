//! Connection settings for the `influxdb` configuration section.

use std::time::Duration;

use serde::Deserialize;

/// InfluxDB v1 connection configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InfluxConfig {
    /// Server host name (default `localhost`).
    #[serde(default = "default_host")]
    pub host: String,
    /// Server port (default 8086).
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    /// Target database.
    pub database: String,
    /// Use `https` instead of `http`.
    #[serde(default)]
    pub ssl: bool,
    /// Verify the server certificate when `ssl` is set.
    #[serde(default = "default_verify_ssl")]
    pub verify_ssl: bool,
    #[serde(default)]
    pub retention_policy: Option<String>,
    /// Per-request timeout in seconds. None = no timeout.
    #[serde(default, alias = "timeout")]
    pub timeout_secs: Option<u64>,
    /// URL prefix when InfluxDB sits behind a reverse proxy, e.g. `influx`.
    #[serde(default)]
    pub path: Option<String>,
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    8086
}

fn default_verify_ssl() -> bool {
    true
}

impl InfluxConfig {
    pub fn new(database: impl Into<String>) -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            username: None,
            password: None,
            database: database.into(),
            ssl: false,
            verify_ssl: default_verify_ssl(),
            retention_policy: None,
            timeout_secs: None,
            path: None,
        }
    }

    pub fn base_url(&self) -> String {
        let scheme = if self.ssl { "https" } else { "http" };
        let prefix = self
            .path
            .as_deref()
            .map(|path| path.trim_matches('/'))
            .filter(|path| !path.is_empty());
        match prefix {
            Some(prefix) => format!("{scheme}://{}:{}/{prefix}", self.host, self.port),
            None => format!("{scheme}://{}:{}", self.host, self.port),
        }
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}
