use std::{
    path::{Path, PathBuf},
    process::ExitStatus,
    time::Duration,
};

use tokio::{
    process::{Child, ChildStdout, Command},
    time,
};
use tracing::{debug, warn};

use crate::{
    reader::{AsyncBoundedLineReader, DecoderLine},
    DecoderError,
};

const SPAWN_ATTEMPTS: u32 = 5;
const ETXTBSY: i32 = 26;
/// How long a child whose stdout already closed gets to exit on its own.
const EOF_EXIT_GRACE: Duration = Duration::from_millis(500);

/// Spawns `command`, retrying briefly while the binary is still busy
/// (ETXTBSY right after it was written, common with freshly created scripts).
pub(crate) fn spawn_with_retry(
    command: &mut Command,
    binary: &Path,
) -> Result<Child, DecoderError> {
    let mut backoff = Duration::from_millis(2);
    let mut attempts_left = SPAWN_ATTEMPTS;
    loop {
        attempts_left -= 1;
        let source = match command.spawn() {
            Ok(child) => return Ok(child),
            Err(source) => source,
        };
        let is_busy = source.raw_os_error() == Some(ETXTBSY);
        if !is_busy || attempts_left == 0 {
            return Err(DecoderError::Spawn {
                binary: binary.to_path_buf(),
                source,
            });
        }
        debug!(?backoff, "decoder binary busy, retrying spawn");
        std::thread::sleep(backoff);
        backoff = std::cmp::min(backoff * 2, Duration::from_millis(50));
    }
}

/// A running decoder and the read side of its stdout.
///
/// Dropping the handle kills the child; call [`DecoderProcess::terminate`] for
/// an orderly stop.
pub struct DecoderProcess {
    child: Child,
    binary: PathBuf,
    stdout: AsyncBoundedLineReader<ChildStdout>,
    terminate_timeout: Duration,
}

impl std::fmt::Debug for DecoderProcess {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecoderProcess")
            .field("binary", &self.binary)
            .field("pid", &self.child.id())
            .field("terminate_timeout", &self.terminate_timeout)
            .finish()
    }
}

impl DecoderProcess {
    pub(crate) fn new(
        mut child: Child,
        binary: PathBuf,
        terminate_timeout: Duration,
        max_line_bytes: usize,
    ) -> Result<Self, DecoderError> {
        let Some(stdout) = child.stdout.take() else {
            let _ = child.start_kill();
            return Err(DecoderError::MissingStdout);
        };

        Ok(Self {
            child,
            binary,
            stdout: AsyncBoundedLineReader::new(stdout, max_line_bytes),
            terminate_timeout,
        })
    }

    /// Waits for the next line of output.
    ///
    /// `Ok(None)` means the decoder closed its stdout, which in practice means
    /// it exited. Oversized or non-UTF-8 lines are returned as their own
    /// [`DecoderLine`] variants and do not end the stream.
    pub async fn next_line(&mut self) -> Result<Option<DecoderLine>, DecoderError> {
        self.stdout
            .next_line()
            .await
            .map_err(DecoderError::StdoutRead)
    }

    /// Interrupts the decoder and waits a bounded time for it to exit.
    ///
    /// If the deadline passes the child is killed and
    /// [`DecoderError::TerminateTimeout`] is returned; this never blocks longer
    /// than the configured timeout.
    pub async fn terminate(&mut self) -> Result<ExitStatus, DecoderError> {
        if let Some(status) = self.child.try_wait().map_err(DecoderError::Wait)? {
            debug!(?status, "decoder already exited");
            return Ok(status);
        }

        if self.stdout.is_finished() {
            let grace = EOF_EXIT_GRACE.min(self.terminate_timeout);
            if let Ok(waited) = time::timeout(grace, self.child.wait()).await {
                return waited.map_err(DecoderError::Wait);
            }
        }

        self.interrupt()?;

        match time::timeout(self.terminate_timeout, self.child.wait()).await {
            Ok(Ok(status)) => Ok(status),
            Ok(Err(source)) => Err(DecoderError::Wait(source)),
            Err(_) => {
                warn!(
                    binary = %self.binary.display(),
                    timeout = ?self.terminate_timeout,
                    "decoder ignored interrupt, killing it"
                );
                let _ = self.child.start_kill();
                Err(DecoderError::TerminateTimeout {
                    timeout: self.terminate_timeout,
                })
            }
        }
    }

    #[cfg(unix)]
    fn interrupt(&mut self) -> Result<(), DecoderError> {
        use nix::{
            sys::signal::{kill, Signal},
            unistd::Pid,
        };

        let Some(pid) = self.child.id() else {
            return Ok(());
        };
        kill(Pid::from_raw(pid as i32), Signal::SIGINT).map_err(|errno| DecoderError::Signal {
            pid,
            source: errno.into(),
        })
    }

    #[cfg(not(unix))]
    fn interrupt(&mut self) -> Result<(), DecoderError> {
        let pid = self.child.id().unwrap_or_default();
        self.child
            .start_kill()
            .map_err(|source| DecoderError::Signal { pid, source })
    }
}
