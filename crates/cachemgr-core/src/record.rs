//! Decoded metric records.

use serde::Serialize;

use crate::error::LineError;

/// One decoded `{key, value}` pair. Keys are not unique within a fetch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Record {
    pub key: String,
    pub value: f64,
}

impl Record {
    pub fn new(key: impl Into<String>, value: f64) -> Self {
        Self {
            key: key.into(),
            value,
        }
    }
}

/// Result of one successful fetch.
///
/// `records` keeps the server's line order. `skipped` lists every line that
/// failed to decode, in order. `stream_error` is set when the body ended with
/// a read error, in which case `records` is a partial result.
#[derive(Debug, Default, Serialize)]
pub struct FetchOutcome {
    pub records: Vec<Record>,
    #[serde(serialize_with = "display_all")]
    pub skipped: Vec<LineError>,
    pub stream_error: Option<String>,
}

impl FetchOutcome {
    /// True when the body stream ended without a read error.
    pub fn is_complete(&self) -> bool {
        self.stream_error.is_none()
    }
}

fn display_all<S>(errs: &[LineError], s: S) -> std::result::Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    s.collect_seq(errs.iter().map(|e| e.to_string()))
}
