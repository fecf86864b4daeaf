use std::{path::PathBuf, process::Stdio, time::Duration};

use tokio::process::Command;
use tracing::info;

use crate::{
    builder::DecoderLauncherBuilder,
    process::{self, DecoderProcess},
    DecoderError,
};

#[derive(Debug, Clone)]
pub struct DecoderLauncher {
    pub(crate) binary: PathBuf,
    pub(crate) terminate_timeout: Duration,
    pub(crate) max_line_bytes: usize,
}

impl DecoderLauncher {
    pub fn builder() -> DecoderLauncherBuilder {
        DecoderLauncherBuilder::default()
    }

    /// Launches the decoder with `argv` and a piped stdout.
    pub fn start(&self, argv: &[String]) -> Result<DecoderProcess, DecoderError> {
        let mut command = Command::new(&self.binary);
        command
            .args(argv)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);

        info!(
            binary = %self.binary.display(),
            args = %argv.join(" "),
            "starting decoder subprocess"
        );
        let child = process::spawn_with_retry(&mut command, &self.binary)?;

        DecoderProcess::new(
            child,
            self.binary.clone(),
            self.terminate_timeout,
            self.max_line_bytes,
        )
    }
}
