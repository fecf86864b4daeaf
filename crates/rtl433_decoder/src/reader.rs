use std::io;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};

const CHUNK_SIZE_BYTES: usize = 8192;

/// One unit of decoder output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecoderLine {
    Text {
        line_number: usize,
        text: String,
    },
    /// The line exceeded the configured limit and was discarded.
    TooLong {
        line_number: usize,
        observed_bytes: usize,
        max_line_bytes: usize,
    },
    InvalidUtf8 {
        line_number: usize,
    },
}

impl DecoderLine {
    pub fn line_number(&self) -> usize {
        match self {
            DecoderLine::Text { line_number, .. }
            | DecoderLine::TooLong { line_number, .. }
            | DecoderLine::InvalidUtf8 { line_number } => *line_number,
        }
    }
}

/// Newline-delimited reader that never buffers more than `max_line_bytes` of a
/// single line. Oversized lines are skipped up to the next newline.
pub(crate) struct AsyncBoundedLineReader<R: AsyncRead + Unpin> {
    reader: BufReader<R>,
    max_line_bytes: usize,
    line_number: usize,
    done: bool,
}

impl<R: AsyncRead + Unpin> AsyncBoundedLineReader<R> {
    pub(crate) fn new(reader: R, max_line_bytes: usize) -> Self {
        Self {
            reader: BufReader::with_capacity(CHUNK_SIZE_BYTES, reader),
            max_line_bytes,
            line_number: 0,
            done: false,
        }
    }

    /// True once end of stream has been observed.
    pub(crate) fn is_finished(&self) -> bool {
        self.done
    }

    pub(crate) async fn next_line(&mut self) -> io::Result<Option<DecoderLine>> {
        if self.done {
            return Ok(None);
        }

        let mut current = Vec::new();
        let mut observed_bytes = 0usize;
        let mut discard_mode = false;

        loop {
            let available = self.reader.fill_buf().await?;
            if available.is_empty() {
                self.done = true;
                if observed_bytes == 0 && !discard_mode {
                    return Ok(None);
                }
                return Ok(Some(self.finish_line(current, observed_bytes, discard_mode)));
            }

            let newline_idx = available.iter().position(|b| *b == b'\n');
            let segment_len = newline_idx.unwrap_or(available.len());

            observed_bytes = observed_bytes.saturating_add(segment_len);
            if observed_bytes > self.max_line_bytes {
                discard_mode = true;
                current.clear();
            } else if !discard_mode {
                current.extend_from_slice(&available[..segment_len]);
            }

            match newline_idx {
                Some(idx) => {
                    self.reader.consume(idx + 1);
                    return Ok(Some(self.finish_line(current, observed_bytes, discard_mode)));
                }
                None => self.reader.consume(segment_len),
            }
        }
    }

    fn finish_line(
        &mut self,
        bytes: Vec<u8>,
        observed_bytes: usize,
        too_long: bool,
    ) -> DecoderLine {
        self.line_number += 1;
        let line_number = self.line_number;

        if too_long {
            return DecoderLine::TooLong {
                line_number,
                observed_bytes,
                max_line_bytes: self.max_line_bytes,
            };
        }

        match String::from_utf8(bytes) {
            Ok(text) => DecoderLine::Text { line_number, text },
            Err(_) => DecoderLine::InvalidUtf8 { line_number },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn collect(bytes: Vec<u8>, max_line_bytes: usize) -> Vec<DecoderLine> {
        let mut reader = AsyncBoundedLineReader::new(std::io::Cursor::new(bytes), max_line_bytes);
        let mut out = Vec::new();
        while let Some(line) = reader.next_line().await.unwrap() {
            out.push(line);
        }
        out
    }

    #[tokio::test]
    async fn oversized_line_is_discarded_and_iteration_continues() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(b"ok\n");
        bytes.extend_from_slice(&vec![b'a'; 50]);
        bytes.extend_from_slice(b"\nnext\n");

        let lines = collect(bytes, 16).await;

        assert_eq!(lines.len(), 3);
        assert!(matches!(&lines[0], DecoderLine::Text { text, .. } if text == "ok"));
        assert!(matches!(
            lines[1],
            DecoderLine::TooLong {
                line_number: 2,
                observed_bytes: 50,
                max_line_bytes: 16
            }
        ));
        assert!(matches!(&lines[2], DecoderLine::Text { text, line_number: 3 } if text == "next"));
    }

    #[tokio::test]
    async fn trailing_line_without_newline_is_delivered() {
        let lines = collect(b"{\"a\":1}\n{\"b\":2}".to_vec(), 1024).await;
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1].line_number(), 2);
    }

    #[tokio::test]
    async fn invalid_utf8_is_reported_per_line() {
        let lines = collect(b"\xff\xfe\nfine\n".to_vec(), 1024).await;
        assert_eq!(lines[0], DecoderLine::InvalidUtf8 { line_number: 1 });
        assert!(matches!(&lines[1], DecoderLine::Text { text, .. } if text == "fine"));
    }

    #[tokio::test]
    async fn empty_input_ends_immediately() {
        assert!(collect(Vec::new(), 16).await.is_empty());
    }
}
