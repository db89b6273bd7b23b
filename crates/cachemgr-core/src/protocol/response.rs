//! HTTP/1.0 response head parsing (status line + headers).
//!
//! The caller feeds head lines one by one (terminator included or not) until
//! `HeadParser::push_line` reports completion. The body is whatever follows on
//! the transport.

use crate::error::{CacheMgrError, Result};

/// Upper bound on the status line plus headers.
pub const MAX_HEAD_BYTES: usize = 64 * 1024;

/// Parsed status line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusLine {
    /// Minor version of `HTTP/1.x`.
    pub minor: u8,
    pub code: u16,
    pub reason: String,
}

/// Parse `HTTP/1.<d> <code>[ <reason>]`.
pub fn parse_status_line(line: &str) -> Result<StatusLine> {
    let line = strip_terminator(line);
    let (version, rest) = line
        .split_once(' ')
        .ok_or_else(|| malformed("status line", line))?;

    let minor = version
        .strip_prefix("HTTP/1.")
        .filter(|m| m.len() == 1)
        .and_then(|m| m.parse::<u8>().ok())
        .ok_or_else(|| malformed("status line", line))?;

    let (code, reason) = match rest.split_once(' ') {
        Some((code, reason)) => (code, reason),
        None => (rest, ""),
    };
    if code.len() != 3 || !code.bytes().all(|b| b.is_ascii_digit()) {
        return Err(malformed("status code", line));
    }
    let code = code
        .parse::<u16>()
        .map_err(|_| malformed("status code", line))?;

    Ok(StatusLine {
        minor,
        code,
        reason: reason.trim().to_string(),
    })
}

/// Parse a `Name: value` header line.
pub fn parse_header_line(line: &str) -> Result<(String, String)> {
    let line = strip_terminator(line);
    let (name, value) = line
        .split_once(':')
        .ok_or_else(|| malformed("header line", line))?;
    let name = name.trim();
    if name.is_empty() || name.contains(char::is_whitespace) {
        return Err(malformed("header name", line));
    }
    Ok((name.to_string(), value.trim().to_string()))
}

/// Parsed status line and headers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseHead {
    pub status: StatusLine,
    pub headers: Vec<(String, String)>,
}

impl ResponseHead {
    /// Case-insensitive header lookup (first match).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Only status 200 carries a report.
    pub fn ensure_success(&self) -> Result<()> {
        if self.status.code != 200 {
            return Err(CacheMgrError::NonSuccessStatus(self.status.code));
        }
        Ok(())
    }

    /// Body length when declared; `None` means read until close.
    pub fn content_length(&self) -> Result<Option<u64>> {
        if let Some(te) = self.header("Transfer-Encoding") {
            if !te.eq_ignore_ascii_case("identity") {
                return Err(CacheMgrError::Protocol(format!(
                    "unsupported transfer-encoding: {te}"
                )));
            }
        }
        match self.header("Content-Length") {
            None => Ok(None),
            Some(v) if !v.is_empty() && v.bytes().all(|b| b.is_ascii_digit()) => v
                .parse::<u64>()
                .map(Some)
                .map_err(|_| CacheMgrError::Protocol(format!("invalid content-length: {v:?}"))),
            Some(v) => Err(CacheMgrError::Protocol(format!("invalid content-length: {v:?}"))),
        }
    }
}

/// Incremental head parser.
#[derive(Debug, Default)]
pub struct HeadParser {
    status: Option<StatusLine>,
    headers: Vec<(String, String)>,
    consumed: usize,
}

impl HeadParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one line. Returns the head once the empty line is seen.
    pub fn push_line(&mut self, line: &str) -> Result<Option<ResponseHead>> {
        self.consumed += line.len();
        if self.consumed > MAX_HEAD_BYTES {
            return Err(CacheMgrError::Protocol("response head too large".into()));
        }

        if self.status.is_none() {
            self.status = Some(parse_status_line(line)?);
            return Ok(None);
        }

        if strip_terminator(line).is_empty() {
            let status = self
                .status
                .take()
                .ok_or_else(|| CacheMgrError::Internal("head parser reused".into()))?;
            return Ok(Some(ResponseHead {
                status,
                headers: std::mem::take(&mut self.headers),
            }));
        }

        self.headers.push(parse_header_line(line)?);
        Ok(None)
    }

    /// The transport hit EOF before the head was complete.
    pub fn truncated(&self) -> CacheMgrError {
        match self.status {
            None => CacheMgrError::Protocol("empty response".into()),
            Some(_) => CacheMgrError::Protocol("truncated response headers".into()),
        }
    }
}

fn strip_terminator(line: &str) -> &str {
    let line = line.strip_suffix('\n').unwrap_or(line);
    line.strip_suffix('\r').unwrap_or(line)
}

fn malformed(what: &str, line: &str) -> CacheMgrError {
    CacheMgrError::Protocol(format!("malformed {what}: {line:?}"))
}
