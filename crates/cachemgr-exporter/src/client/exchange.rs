//! One request/response exchange on an already connected stream.

use std::io;
use std::pin::Pin;
use std::task::{ready, Context, Poll};

use tokio::io::{
    AsyncBufRead, AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader,
    ReadBuf,
};

use cachemgr_core::error::{CacheMgrError, Result};
use cachemgr_core::protocol::request::encode_request;
use cachemgr_core::protocol::response::{HeadParser, ResponseHead, MAX_HEAD_BYTES};

use super::ClientConfig;

/// Response body, bounded by `Content-Length` when the server sent one.
///
/// With a declared length, EOF before the last byte is an
/// `UnexpectedEof` read error rather than a clean end of stream.
pub struct ReportBody<S> {
    inner: BufReader<S>,
    remaining: Option<u64>,
}

impl<S> ReportBody<S> {
    pub fn new(inner: BufReader<S>, content_length: Option<u64>) -> Self {
        Self {
            inner,
            remaining: content_length,
        }
    }
}

impl<S> AsyncBufRead for ReportBody<S>
where
    S: AsyncRead + Unpin,
{
    fn poll_fill_buf(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<&[u8]>> {
        let this = self.get_mut();
        if this.remaining == Some(0) {
            return Poll::Ready(Ok(&[]));
        }

        let buf = ready!(Pin::new(&mut this.inner).poll_fill_buf(cx))?;
        match this.remaining {
            None => Poll::Ready(Ok(buf)),
            Some(left) if buf.is_empty() => Poll::Ready(Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("body ended {left} bytes short of content-length"),
            ))),
            Some(left) => {
                let n = buf.len().min(usize::try_from(left).unwrap_or(usize::MAX));
                Poll::Ready(Ok(&buf[..n]))
            }
        }
    }

    fn consume(self: Pin<&mut Self>, amt: usize) {
        let this = self.get_mut();
        if let Some(left) = this.remaining.as_mut() {
            *left = left.saturating_sub(amt as u64);
        }
        Pin::new(&mut this.inner).consume(amt);
    }
}

impl<S> AsyncRead for ReportBody<S>
where
    S: AsyncRead + Unpin,
{
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        out: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        let n = {
            let buf = ready!(Pin::new(&mut *this).poll_fill_buf(cx))?;
            let n = buf.len().min(out.remaining());
            out.put_slice(&buf[..n]);
            n
        };
        Pin::new(this).consume(n);
        Poll::Ready(Ok(()))
    }
}

/// Write preamble and request, read and validate the head, return the body.
pub async fn open_report<S>(mut stream: S, cfg: &ClientConfig, endpoint: &str) -> Result<ReportBody<S>>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    if let Some(header) = &cfg.proxy_header {
        stream
            .write_all(&header.encode())
            .await
            .map_err(|e| io_error("write proxy header", e))?;
    }

    let request = encode_request(endpoint, &cfg.user_agent, cfg.auth_token.as_deref());
    stream
        .write_all(&request)
        .await
        .map_err(|e| io_error("write request", e))?;
    stream.flush().await.map_err(|e| io_error("flush request", e))?;

    let mut reader = BufReader::new(stream);
    let head = read_head(&mut reader).await?;
    head.ensure_success()?;

    Ok(ReportBody::new(reader, head.content_length()?))
}

/// Read status line and headers up to the blank line.
pub async fn read_head<R>(reader: &mut R) -> Result<ResponseHead>
where
    R: AsyncBufRead + Unpin,
{
    let mut parser = HeadParser::new();
    let mut buf = Vec::with_capacity(128);

    loop {
        buf.clear();
        let n = AsyncReadExt::take(&mut *reader, MAX_HEAD_BYTES as u64 + 1)
            .read_until(b'\n', &mut buf)
            .await
            .map_err(|e| io_error("read response head", e))?;
        if n == 0 {
            return Err(parser.truncated());
        }

        if let Some(head) = parser.push_line(&String::from_utf8_lossy(&buf))? {
            return Ok(head);
        }
    }
}

fn io_error(what: &str, e: io::Error) -> CacheMgrError {
    CacheMgrError::Protocol(format!("{what}: {e}"))
}
