#![forbid(unsafe_code)]
//! Pure decoding primitives for `rtl_433 -F json` output.
//!
//! This crate performs no I/O. It provides:
//! - A line parser turning one line of decoder output into a [`RawEvent`].
//! - The tag/field split applied to every event before it is stored.

mod error;
mod line_parser;
mod normalized;

pub use error::{ErrorCode, LineError};
pub use line_parser::{EventLineParser, RawEvent};
pub use normalized::{normalize, NormalizedRecord, StaticTags, TagValue, TAG_KEYS, TIME_KEY};
