#![forbid(unsafe_code)]
//! Streaming ingestion from `rtl_433` into InfluxDB.
//!
//! [`IngestLoop`] owns the control flow: start the decoder, connect the store,
//! then read, decode, normalize and write one line at a time until the decoder
//! exits or shutdown is requested. Per-line failures are logged and skipped;
//! the decoder is always terminated on the way out.

mod config;
mod ingest;
mod shutdown;

pub use config::{AppConfig, ConfigError};
pub use ingest::{
    IngestLoop, IngestOutcome, IngestState, IngestStats, LineSource, PointSink, StopReason,
    MEASUREMENT,
};
pub use shutdown::spawn_signal_listener;
