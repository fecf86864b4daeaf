use std::{path::PathBuf, time::Duration};

use crate::launcher::DecoderLauncher;

const DEFAULT_BINARY: &str = "rtl_433";
/// How long `terminate` waits after the interrupt unless configured otherwise.
pub const DEFAULT_TERMINATE_TIMEOUT: Duration = Duration::from_secs(5);
const DEFAULT_MAX_LINE_BYTES: usize = 64 * 1024;

#[derive(Debug, Clone)]
pub struct DecoderLauncherBuilder {
    pub(crate) binary: Option<PathBuf>,
    pub(crate) terminate_timeout: Duration,
    pub(crate) max_line_bytes: usize,
}

impl Default for DecoderLauncherBuilder {
    fn default() -> Self {
        Self {
            binary: None,
            terminate_timeout: DEFAULT_TERMINATE_TIMEOUT,
            max_line_bytes: DEFAULT_MAX_LINE_BYTES,
        }
    }
}

impl DecoderLauncherBuilder {
    pub fn binary(mut self, binary: impl Into<PathBuf>) -> Self {
        self.binary = Some(binary.into());
        self
    }

    /// How long `terminate` waits after the interrupt before giving up.
    pub fn terminate_timeout(mut self, timeout: Duration) -> Self {
        self.terminate_timeout = timeout;
        self
    }

    pub fn max_line_bytes(mut self, max_line_bytes: usize) -> Self {
        self.max_line_bytes = max_line_bytes;
        self
    }

    pub fn build(self) -> DecoderLauncher {
        DecoderLauncher {
            binary: self
                .binary
                .unwrap_or_else(|| PathBuf::from(DEFAULT_BINARY)),
            terminate_timeout: self.terminate_timeout,
            max_line_bytes: self.max_line_bytes,
        }
    }
}
