//! Shared error types across cachemgr crates.

use std::time::Duration;

use thiserror::Error;

use crate::protocol::report::ReportKind;

/// Stable error classes (used for HTTP responses and metric labels).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Dial or transport failure before any protocol exchange.
    Connection,
    /// Non-200 status or malformed response framing.
    Protocol,
    /// Fetch deadline expired.
    Timeout,
    /// Invalid configuration.
    Config,
    /// Internal error.
    Internal,
}

impl ErrorKind {
    /// String representation used in JSON responses and labels.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::Connection => "CONNECTION",
            ErrorKind::Protocol => "PROTOCOL",
            ErrorKind::Timeout => "TIMEOUT",
            ErrorKind::Config => "CONFIG",
            ErrorKind::Internal => "INTERNAL",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, CacheMgrError>;

/// Fatal errors: a fetch that returns one of these produced no records.
#[derive(Debug, Error)]
pub enum CacheMgrError {
    #[error("connect to {addr} failed: {source}")]
    Connect {
        addr: String,
        #[source]
        source: std::io::Error,
    },
    #[error("non success code {0} while fetching metrics")]
    NonSuccessStatus(u16),
    #[error("protocol: {0}")]
    Protocol(String),
    #[error("fetch timed out after {0:?}")]
    Timeout(Duration),
    #[error("bad config: {0}")]
    BadConfig(String),
    #[error("unsupported config version")]
    UnsupportedVersion,
    #[error("internal: {0}")]
    Internal(String),
}

impl CacheMgrError {
    /// Map to a stable error class.
    pub fn kind(&self) -> ErrorKind {
        match self {
            CacheMgrError::Connect { .. } => ErrorKind::Connection,
            CacheMgrError::NonSuccessStatus(_) | CacheMgrError::Protocol(_) => ErrorKind::Protocol,
            CacheMgrError::Timeout(_) => ErrorKind::Timeout,
            CacheMgrError::BadConfig(_) | CacheMgrError::UnsupportedVersion => ErrorKind::Config,
            CacheMgrError::Internal(_) => ErrorKind::Internal,
        }
    }
}

/// Non-fatal failure to decode one report line. The line is skipped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LineError {
    #[error("{report} - could not parse line, missing '{delimiter}': {line:?}")]
    MissingDelimiter {
        report: ReportKind,
        delimiter: char,
        line: String,
    },
    #[error("{report} - could not parse line, empty key: {line:?}")]
    EmptyKey { report: ReportKind, line: String },
    #[error("{report} - could not parse line, empty percentile qualifier: {line:?}")]
    EmptyQualifier { report: ReportKind, line: String },
    #[error("{report} - could not parse line, value {value:?} is not numeric: {line:?}")]
    NotNumeric {
        report: ReportKind,
        value: String,
        line: String,
    },
}

impl LineError {
    /// Report the failing line belongs to.
    pub fn report(&self) -> ReportKind {
        match self {
            LineError::MissingDelimiter { report, .. }
            | LineError::EmptyKey { report, .. }
            | LineError::EmptyQualifier { report, .. }
            | LineError::NotNumeric { report, .. } => *report,
        }
    }
}
