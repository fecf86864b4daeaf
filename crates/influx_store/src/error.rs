use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("invalid InfluxDB URL `{url}`: {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("unable to reach InfluxDB: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("InfluxDB server error ({status}): {body}")]
    Server { status: u16, body: String },
    #[error("InfluxDB rejected the point ({status}): {body}")]
    Rejected { status: u16, body: String },
    #[error("point cannot be encoded: {0}")]
    Encode(String),
}

impl StoreError {
    /// Whether the failure came from the server side or the network rather
    /// than from the point itself.
    pub fn is_connection_error(&self) -> bool {
        matches!(self, StoreError::Transport(_) | StoreError::Server { .. })
    }
}
