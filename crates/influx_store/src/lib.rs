#![forbid(unsafe_code)]
//! Minimal InfluxDB writer.
//!
//! Points are written one at a time through the v1 `/write` endpoint. There is
//! no batching and no local retry queue: a failed write is reported to the
//! caller and the point is gone.

mod client;
mod config;
mod error;
mod line_protocol;
mod point;

pub use client::{InfluxClient, DEFAULT_CONNECT_RETRY_DELAY};
pub use config::InfluxConfig;
pub use error::StoreError;
pub use line_protocol::{encode_point, FieldValue};
pub use point::Point;
