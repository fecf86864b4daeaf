use std::{path::PathBuf, process::ExitCode, time::Duration};

use clap::Parser;
use influx_store::{InfluxClient, DEFAULT_CONNECT_RETRY_DELAY};
use rtl433_decoder::{DecoderArgs, DecoderLauncher, DEFAULT_TERMINATE_TIMEOUT};
use rtl433_influx::{spawn_signal_listener, AppConfig, IngestLoop};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "rtl433-influx")]
#[command(about = "Run rtl_433 and forward its JSON events to InfluxDB")]
struct Cli {
    /// Path to the YAML configuration file.
    #[arg(default_value = "config.yaml")]
    config: PathBuf,

    /// Decoder executable to launch.
    #[arg(long, default_value = "rtl_433")]
    decoder_binary: PathBuf,

    /// Seconds to wait for the decoder to exit after interrupting it.
    #[arg(long, default_value_t = DEFAULT_TERMINATE_TIMEOUT.as_secs())]
    terminate_timeout: u64,

    /// Seconds between InfluxDB connection attempts at startup.
    #[arg(long, default_value_t = DEFAULT_CONNECT_RETRY_DELAY.as_secs())]
    connect_retry_secs: u64,
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    let config = match AppConfig::load(&cli.config) {
        Ok(config) => config,
        Err(error) => {
            error!(%error, "unable to load configuration");
            eprintln!(
                "If the file does not exist, please copy config.yaml.example and modify it to match your system."
            );
            return ExitCode::FAILURE;
        }
    };

    let argv = DecoderArgs::new()
        .options(config.rtlsdr.clone().unwrap_or_default())
        .argv();
    let launcher = DecoderLauncher::builder()
        .binary(cli.decoder_binary)
        .terminate_timeout(Duration::from_secs(cli.terminate_timeout))
        .build();

    let shutdown = CancellationToken::new();
    spawn_signal_listener(shutdown.clone());

    let ingest = IngestLoop::new(shutdown).static_tags(config.tags.clone());
    let connect = InfluxClient::connect(
        config.influxdb.clone(),
        Duration::from_secs(cli.connect_retry_secs),
    );

    // Panics inside the loop are turned into faults there. Anything that
    // still escapes surfaces here as a join error.
    let run = tokio::spawn(ingest.run(move || launcher.start(&argv), connect));
    match run.await {
        Ok(outcome) => {
            info!(reason = ?outcome.reason, "exiting");
            outcome.exit_code()
        }
        Err(error) => {
            error!(%error, "an unhandled exception occurred");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
