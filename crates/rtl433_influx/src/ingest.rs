use std::{
    any::Any,
    fmt,
    future::Future,
    panic::{self, AssertUnwindSafe},
    process::ExitCode,
};

use futures::FutureExt;
use influx_store::{InfluxClient, Point, StoreError};
use rtl433_decoder::{DecoderError, DecoderLine, DecoderProcess};
use rtl433_events::{normalize, EventLineParser, LineError, StaticTags};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Measurement name every point is written under.
pub const MEASUREMENT: &str = "rtl433";

/// Where lines come from and how the producer is stopped.
pub trait LineSource {
    type Error: std::error::Error;

    /// Next line, or `None` once the producer has closed its output.
    fn next_line(
        &mut self,
    ) -> impl Future<Output = Result<Option<DecoderLine>, Self::Error>> + Send;

    /// Stops the producer. Called exactly once per run.
    fn terminate(&mut self) -> impl Future<Output = Result<(), Self::Error>> + Send;
}

/// Where points go.
pub trait PointSink {
    type Error: std::error::Error;

    fn write(&self, point: &Point) -> impl Future<Output = Result<(), Self::Error>> + Send;
}

impl LineSource for DecoderProcess {
    type Error = DecoderError;

    async fn next_line(&mut self) -> Result<Option<DecoderLine>, DecoderError> {
        DecoderProcess::next_line(self).await
    }

    async fn terminate(&mut self) -> Result<(), DecoderError> {
        let status = DecoderProcess::terminate(self).await?;
        info!(%status, "decoder exited");
        Ok(())
    }
}

impl PointSink for InfluxClient {
    type Error = StoreError;

    async fn write(&self, point: &Point) -> Result<(), StoreError> {
        InfluxClient::write(self, point).await
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum IngestState {
    Starting,
    Connecting,
    Running,
    Draining,
    Stopped,
}

impl fmt::Display for IngestState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            IngestState::Starting => "starting",
            IngestState::Connecting => "connecting",
            IngestState::Running => "running",
            IngestState::Draining => "draining",
            IngestState::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub enum StopReason {
    /// The decoder closed its stdout.
    EndOfStream,
    /// A termination signal or an explicit cancel.
    ShutdownRequested,
    /// Something outside the per-line error classes went wrong.
    Fault(String),
}

#[derive(Debug, Clone, Copy, Default, Eq, PartialEq)]
pub struct IngestStats {
    pub lines_read: u64,
    pub lines_skipped: u64,
    pub points_written: u64,
    pub writes_failed: u64,
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct IngestOutcome {
    pub reason: StopReason,
    pub stats: IngestStats,
    /// Set when the decoder could not be stopped cleanly. Informational only.
    pub terminate_error: Option<String>,
}

impl IngestOutcome {
    pub fn is_clean(&self) -> bool {
        !matches!(self.reason, StopReason::Fault(_))
    }

    pub fn exit_code(&self) -> ExitCode {
        if self.is_clean() {
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        }
    }
}

/// What happened to one line.
enum LineOutcome {
    Written,
    Skipped,
    WriteFailed,
}

pub struct IngestLoop {
    parser: EventLineParser,
    static_tags: Option<StaticTags>,
    shutdown: CancellationToken,
    state: IngestState,
    stats: IngestStats,
}

impl IngestLoop {
    pub fn new(shutdown: CancellationToken) -> Self {
        Self {
            parser: EventLineParser::new(),
            static_tags: None,
            shutdown,
            state: IngestState::Starting,
            stats: IngestStats::default(),
        }
    }

    pub fn static_tags(mut self, tags: Option<StaticTags>) -> Self {
        self.static_tags = tags;
        self
    }

    /// Runs the whole lifecycle.
    ///
    /// `start` launches the line producer. `connect` resolves to the sink and
    /// may retry internally for as long as it likes; a shutdown request still
    /// interrupts it. Once `start` has succeeded the source is terminated
    /// exactly once, whatever the reason for stopping, including a panic in
    /// the source, the sink or line processing.
    pub async fn run<S, SE, K, C, CE>(
        mut self,
        start: impl FnOnce() -> Result<S, SE>,
        connect: C,
    ) -> IngestOutcome
    where
        S: LineSource,
        SE: fmt::Display,
        K: PointSink,
        C: Future<Output = Result<K, CE>>,
        CE: fmt::Display,
    {
        let mut source = match start() {
            Ok(source) => source,
            Err(error) => {
                error!(%error, "unable to start decoder");
                self.transition(IngestState::Stopped);
                return self.outcome(StopReason::Fault(error.to_string()), None);
            }
        };

        self.transition(IngestState::Connecting);
        let shutdown = self.shutdown.clone();
        let sink = tokio::select! {
            biased;
            _ = shutdown.cancelled() => Err(StopReason::ShutdownRequested),
            connected = AssertUnwindSafe(connect).catch_unwind() => match connected {
                Ok(Ok(sink)) => Ok(sink),
                Ok(Err(error)) => {
                    error!(%error, "unable to set up InfluxDB client");
                    Err(StopReason::Fault(error.to_string()))
                }
                Err(payload) => Err(panic_fault(payload)),
            },
        };

        let reason = match sink {
            Ok(sink) => {
                self.transition(IngestState::Running);
                AssertUnwindSafe(self.run_lines(&mut source, &sink))
                    .catch_unwind()
                    .await
                    .unwrap_or_else(panic_fault)
            }
            Err(reason) => reason,
        };

        self.transition(IngestState::Draining);
        info!("shutting down decoder subprocess");
        let terminated = AssertUnwindSafe(source.terminate()).catch_unwind().await;
        let terminate_error = match terminated {
            Ok(Ok(())) => None,
            Ok(Err(error)) => {
                warn!(%error, "decoder did not shut down cleanly");
                Some(error.to_string())
            }
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                error!(%message, "panic while shutting down decoder");
                Some(message)
            }
        };

        self.transition(IngestState::Stopped);
        self.outcome(reason, terminate_error)
    }

    async fn run_lines<S, K>(&mut self, source: &mut S, sink: &K) -> StopReason
    where
        S: LineSource,
        K: PointSink,
    {
        let shutdown = self.shutdown.clone();
        loop {
            let next = tokio::select! {
                biased;
                _ = shutdown.cancelled() => {
                    info!("shutdown requested");
                    return StopReason::ShutdownRequested;
                }
                next = source.next_line() => next,
            };

            let line = match next {
                Ok(Some(line)) => line,
                Ok(None) => {
                    info!("decoder closed its output");
                    return StopReason::EndOfStream;
                }
                Err(error) => {
                    error!(%error, "an unhandled error occurred while reading decoder output");
                    return StopReason::Fault(error.to_string());
                }
            };

            self.stats.lines_read += 1;
            match self.process_line(line, sink).await {
                Ok(LineOutcome::Written) => self.stats.points_written += 1,
                Ok(LineOutcome::Skipped) => self.stats.lines_skipped += 1,
                Ok(LineOutcome::WriteFailed) => self.stats.writes_failed += 1,
                Err(fault) => return fault,
            }
        }
    }

    async fn process_line<K: PointSink>(
        &self,
        line: DecoderLine,
        sink: &K,
    ) -> Result<LineOutcome, StopReason> {
        let (line_number, text) = match line {
            DecoderLine::Text { line_number, text } => (line_number, text),
            DecoderLine::TooLong {
                line_number,
                observed_bytes,
                max_line_bytes,
            } => {
                warn!(
                    line_number,
                    observed_bytes, max_line_bytes, "discarding oversized decoder line"
                );
                return Ok(LineOutcome::Skipped);
            }
            DecoderLine::InvalidUtf8 { line_number } => {
                warn!(line_number, "discarding decoder line that is not valid UTF-8");
                return Ok(LineOutcome::Skipped);
            }
        };

        let prepared = panic::catch_unwind(AssertUnwindSafe(|| self.prepare(&text)));
        let point = match prepared {
            Ok(Ok(Some(point))) => point,
            Ok(Ok(None)) => return Ok(LineOutcome::Skipped),
            Ok(Err(err)) => {
                warn!(
                    line_number,
                    code = err.code().as_str(),
                    error = %err.redacted_summary(),
                    line = %err.line,
                    "unable to convert line"
                );
                return Ok(LineOutcome::Skipped);
            }
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                error!(line_number, line = %text, %message, "an unhandled exception occurred");
                return Err(StopReason::Fault(message));
            }
        };

        match sink.write(&point).await {
            Ok(()) => {
                debug!(line_number, "point written");
                Ok(LineOutcome::Written)
            }
            Err(error) => {
                warn!(%error, %point, "unable to write to InfluxDB, dropping point");
                Ok(LineOutcome::WriteFailed)
            }
        }
    }

    /// Decode, normalize and stamp one line. `Ok(None)` for blank lines.
    fn prepare(&self, text: &str) -> Result<Option<Point>, LineError> {
        let Some(raw) = self.parser.parse_line(text)? else {
            return Ok(None);
        };
        let record = normalize(raw, self.static_tags.as_ref());
        let tags = record
            .tags
            .into_iter()
            .map(|(key, value)| (key, value.into_option()))
            .collect();
        Ok(Some(Point::now(MEASUREMENT, tags, record.fields)))
    }

    fn transition(&mut self, next: IngestState) {
        debug!(from = %self.state, to = %next, "ingest state change");
        self.state = next;
    }

    fn outcome(&self, reason: StopReason, terminate_error: Option<String>) -> IngestOutcome {
        info!(
            ?reason,
            lines_read = self.stats.lines_read,
            lines_skipped = self.stats.lines_skipped,
            points_written = self.stats.points_written,
            writes_failed = self.stats.writes_failed,
            "ingestion stopped"
        );
        IngestOutcome {
            reason,
            stats: self.stats,
            terminate_error,
        }
    }
}

fn panic_fault(payload: Box<dyn Any + Send>) -> StopReason {
    let message = panic_message(payload.as_ref());
    error!(%message, "an unhandled exception occurred");
    StopReason::Fault(message)
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "panic with non-string payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn states_render_lowercase() {
        assert_eq!(IngestState::Starting.to_string(), "starting");
        assert_eq!(IngestState::Draining.to_string(), "draining");
    }

    #[test]
    fn prepare_stamps_measurement_and_skips_blank_lines() {
        let ingest = IngestLoop::new(CancellationToken::new());
        assert!(ingest.prepare("").unwrap().is_none());

        let point = ingest
            .prepare(r#"{"model":"Bresser-3CH","id":3,"temperature_C":18.0}"#)
            .unwrap()
            .unwrap();
        assert_eq!(point.measurement(), MEASUREMENT);
        assert_eq!(point.tags()["id"].as_deref(), Some("3"));
        assert_eq!(point.tags()["OS"], None);
    }

    #[test]
    fn faults_map_to_failure_exit() {
        let outcome = IngestOutcome {
            reason: StopReason::Fault("boom".to_string()),
            stats: IngestStats::default(),
            terminate_error: None,
        };
        assert!(!outcome.is_clean());

        let panic = panic::catch_unwind(|| panic!("bad line")).unwrap_err();
        assert_eq!(panic_message(panic.as_ref()), "bad line");
    }
}
