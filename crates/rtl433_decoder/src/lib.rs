#![forbid(unsafe_code)]
//! Async supervisor for the `rtl_433` radio decoder.
//!
//! The decoder is launched as a child process with its stdout piped. Output is
//! consumed one bounded line at a time and the child is stopped with `SIGINT`
//! followed by a bounded wait. Stderr is inherited, never captured.

mod args;
mod builder;
mod error;
mod launcher;
mod process;
mod reader;

pub use args::{ArgValue, DecoderArgs, RtlSdrOptions, BASE_ARGS};
pub use builder::{DecoderLauncherBuilder, DEFAULT_TERMINATE_TIMEOUT};
pub use error::DecoderError;
pub use launcher::DecoderLauncher;
pub use process::DecoderProcess;
pub use reader::DecoderLine;
