use std::time::Duration;

use reqwest::{Response, Url};
use tokio::time;
use tracing::{debug, info, warn};

use crate::{line_protocol::encode_point, InfluxConfig, Point, StoreError};

/// Delay between connection attempts at startup.
pub const DEFAULT_CONNECT_RETRY_DELAY: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
pub struct InfluxClient {
    http: reqwest::Client,
    config: InfluxConfig,
    ping_url: Url,
    write_url: Url,
}

impl InfluxClient {
    /// Builds a client without touching the network.
    pub fn new(config: InfluxConfig) -> Result<Self, StoreError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.timeout() {
            builder = builder.timeout(timeout);
        }
        if config.ssl && !config.verify_ssl {
            builder = builder.danger_accept_invalid_certs(true);
        }
        let http = builder.build().map_err(StoreError::Client)?;

        let base = config.base_url();
        let ping_url = parse_url(&format!("{base}/ping"))?;
        let mut write_url = parse_url(&format!("{base}/write"))?;
        {
            let mut query = write_url.query_pairs_mut();
            query.append_pair("db", &config.database);
            query.append_pair("precision", "ns");
            if let Some(rp) = config.retention_policy.as_deref() {
                query.append_pair("rp", rp);
            }
            if let Some(username) = config.username.as_deref() {
                query.append_pair("u", username);
            }
            if let Some(password) = config.password.as_deref() {
                query.append_pair("p", password);
            }
        }

        Ok(Self {
            http,
            config,
            ping_url,
            write_url,
        })
    }

    /// Builds a client and blocks until the server answers a ping.
    ///
    /// Any failure to reach the server is logged and retried after
    /// `retry_delay`, forever. Only a client that cannot be built at all is
    /// returned as an error.
    pub async fn connect(config: InfluxConfig, retry_delay: Duration) -> Result<Self, StoreError> {
        let client = Self::new(config)?;
        let mut attempt: u64 = 0;
        loop {
            attempt += 1;
            match client.ping().await {
                Ok(()) => {
                    info!(
                        url = %client.config.base_url(),
                        database = %client.config.database,
                        attempt,
                        "connected to InfluxDB"
                    );
                    return Ok(client);
                }
                Err(error) => {
                    warn!(
                        %error,
                        attempt,
                        retry_in = ?retry_delay,
                        "unable to connect to InfluxDB, retrying"
                    );
                    time::sleep(retry_delay).await;
                }
            }
        }
    }

    pub fn config(&self) -> &InfluxConfig {
        &self.config
    }

    pub async fn ping(&self) -> Result<(), StoreError> {
        let response = self
            .http
            .get(self.ping_url.clone())
            .send()
            .await
            .map_err(StoreError::Transport)?;
        check_status(response).await
    }

    /// Writes exactly one point.
    pub async fn write(&self, point: &Point) -> Result<(), StoreError> {
        let body = encode_point(point)?;
        debug!(line = %body, "writing point");
        let response = self
            .http
            .post(self.write_url.clone())
            .body(body)
            .send()
            .await
            .map_err(StoreError::Transport)?;
        check_status(response).await
    }
}

fn parse_url(url: &str) -> Result<Url, StoreError> {
    Url::parse(url).map_err(|err| StoreError::InvalidUrl {
        url: url.to_string(),
        reason: err.to_string(),
    })
}

async fn check_status(response: Response) -> Result<(), StoreError> {
    let status = response.status();
    if status.is_success() {
        return Ok(());
    }

    let body = response.text().await.unwrap_or_default();
    let status = status.as_u16();
    if (500..600).contains(&status) {
        Err(StoreError::Server { status, body })
    } else {
        Err(StoreError::Rejected { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_url_carries_database_and_credentials() {
        let mut config = InfluxConfig::new("weather");
        config.username = Some("agent".to_string());
        config.password = Some("p&ss word".to_string());
        config.retention_policy = Some("week".to_string());

        let client = InfluxClient::new(config).unwrap();
        let url = client.write_url.as_str();

        assert!(url.starts_with("http://localhost:8086/write?"));
        assert!(url.contains("db=weather"));
        assert!(url.contains("precision=ns"));
        assert!(url.contains("rp=week"));
        assert!(url.contains("u=agent"));
        assert!(url.contains("p=p%26ss+word"));
        assert_eq!(client.ping_url.as_str(), "http://localhost:8086/ping");
    }

    #[test]
    fn bad_host_is_reported_as_invalid_url() {
        let mut config = InfluxConfig::new("x");
        config.host = "not a host".to_string();
        assert!(matches!(
            InfluxClient::new(config),
            Err(StoreError::InvalidUrl { .. })
        ));
    }
}
