//! Pull-based line producer and the per-fetch decode loop.

use std::io;

use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use cachemgr_core::protocol::report::ReportKind;
use cachemgr_core::FetchOutcome;

/// Lazy, single-pass sequence of body lines (terminator included).
///
/// A read error ends the sequence; it is kept for `into_error` instead of
/// being raised, so the caller still gets the lines read so far.
pub struct LineReader<R> {
    inner: R,
    buf: Vec<u8>,
    done: bool,
    error: Option<io::Error>,
}

impl<R> LineReader<R>
where
    R: AsyncBufRead + Unpin,
{
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            buf: Vec::with_capacity(256),
            done: false,
            error: None,
        }
    }

    /// Next line, or `None` at end of stream or after a read error.
    pub async fn next_line(&mut self) -> Option<String> {
        if self.done {
            return None;
        }

        self.buf.clear();
        match self.inner.read_until(b'\n', &mut self.buf).await {
            Ok(0) => {
                self.done = true;
                None
            }
            Ok(_) => Some(String::from_utf8_lossy(&self.buf).into_owned()),
            Err(e) => {
                tracing::warn!(error = %e, "report stream ended abnormally");
                self.error = Some(e);
                self.done = true;
                None
            }
        }
    }

    pub fn into_error(self) -> Option<io::Error> {
        self.error
    }
}

/// Decode every line of `body` as `report`, keeping line order.
pub async fn decode_body<R>(report: ReportKind, body: R) -> FetchOutcome
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = LineReader::new(body);
    let mut out = FetchOutcome::default();

    while let Some(line) = lines.next_line().await {
        match report.decode_line(&line) {
            Ok(Some(record)) => out.records.push(record),
            Ok(None) => {} // section header
            Err(e) => {
                tracing::debug!(report = report.endpoint(), error = %e, "skipping line");
                out.skipped.push(e);
            }
        }
    }

    out.stream_error = lines.into_error().map(|e| e.to_string());
    out
}
