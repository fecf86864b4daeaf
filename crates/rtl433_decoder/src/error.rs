use std::{path::PathBuf, time::Duration};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DecoderError {
    #[error("decoder binary `{binary}` could not be spawned: {source}")]
    Spawn {
        binary: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("internal error: missing decoder stdout pipe")]
    MissingStdout,
    #[error("failed reading decoder stdout: {0}")]
    StdoutRead(#[source] std::io::Error),
    #[error("failed to signal decoder process {pid}: {source}")]
    Signal {
        pid: u32,
        #[source]
        source: std::io::Error,
    },
    #[error("failed waiting for decoder process: {0}")]
    Wait(#[source] std::io::Error),
    #[error("decoder did not exit within {timeout:?} of the interrupt")]
    TerminateTimeout { timeout: Duration },
}
