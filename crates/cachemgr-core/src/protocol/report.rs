//! Report line decoders.
//!
//! Both reports are line oriented `<label><delimiter><value>` dumps and share
//! one decoding strategy (`LineFormat`). They differ in:
//! - delimiter: `=` for `counters`, `:` for `service_times`;
//! - section headers (`label:` alone) exist only in `service_times`;
//! - `service_times` values may carry a `<pct>%` qualifier before the number;
//! - `service_times` labels are sanitized into metric-safe keys.

use std::fmt;

use crate::error::LineError;
use crate::record::Record;

/// Reports served by the cache manager that this crate understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReportKind {
    Counters,
    ServiceTimes,
}

impl ReportKind {
    pub const ALL: [ReportKind; 2] = [ReportKind::Counters, ReportKind::ServiceTimes];

    /// Literal path segment after `cache_object://localhost/`.
    pub fn endpoint(self) -> &'static str {
        match self {
            ReportKind::Counters => "counters",
            ReportKind::ServiceTimes => "service_times",
        }
    }

    pub fn from_endpoint(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.endpoint() == name)
    }

    pub fn format(self) -> &'static LineFormat {
        match self {
            ReportKind::Counters => &COUNTERS,
            ReportKind::ServiceTimes => &SERVICE_TIMES,
        }
    }

    /// Decode one line of this report.
    pub fn decode_line(self, line: &str) -> Result<Option<Record>, LineError> {
        self.format().decode(line)
    }
}

impl fmt::Display for ReportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ReportKind::Counters => "counter",
            ReportKind::ServiceTimes => "service times",
        })
    }
}

/// Line grammar of one report.
#[derive(Debug)]
pub struct LineFormat {
    pub report: ReportKind,
    pub delimiter: char,
    /// `label:` lines with no payload are section headers, not metrics.
    pub section_headers: bool,
    /// Marker separating a qualifier (appended to the key) from the value.
    pub qualifier_marker: Option<char>,
    /// Replace spaces with `_` and drop parentheses in keys.
    pub sanitize_key: bool,
}

pub const COUNTERS: LineFormat = LineFormat {
    report: ReportKind::Counters,
    delimiter: '=',
    section_headers: false,
    qualifier_marker: None,
    sanitize_key: false,
};

pub const SERVICE_TIMES: LineFormat = LineFormat {
    report: ReportKind::ServiceTimes,
    delimiter: ':',
    section_headers: true,
    qualifier_marker: Some('%'),
    sanitize_key: true,
};

impl LineFormat {
    /// `Ok(None)` for section headers, `Ok(Some(_))` for metrics.
    pub fn decode(&self, line: &str) -> Result<Option<Record>, LineError> {
        if self.section_headers && is_section_header(line, self.delimiter) {
            return Ok(None);
        }

        let (label, value) = line.split_once(self.delimiter).ok_or_else(|| {
            LineError::MissingDelimiter {
                report: self.report,
                delimiter: self.delimiter,
                line: display_line(line),
            }
        })?;

        let label = label.trim();
        if label.is_empty() {
            return Err(LineError::EmptyKey {
                report: self.report,
                line: display_line(line),
            });
        }
        let mut key = if self.sanitize_key {
            sanitize_key(label)
        } else {
            label.to_string()
        };

        let mut value = value.trim();
        if let Some(marker) = self.qualifier_marker {
            if let Some((qualifier, rest)) = value.split_once(marker) {
                let qualifier = qualifier.trim();
                if qualifier.is_empty() {
                    return Err(LineError::EmptyQualifier {
                        report: self.report,
                        line: display_line(line),
                    });
                }
                key = format!("{key}_{qualifier}");
                value = rest.trim();
            }
        }

        // trailing annotations (units, dates) are dropped
        let token = value.split_whitespace().next().unwrap_or("");
        let value = token.parse::<f64>().map_err(|_| LineError::NotNumeric {
            report: self.report,
            value: token.to_string(),
            line: display_line(line),
        })?;

        Ok(Some(Record { key, value }))
    }
}

/// Decode one `counters` line.
pub fn decode_counter(line: &str) -> Result<Record, LineError> {
    COUNTERS.decode(line)?.ok_or_else(|| LineError::EmptyKey {
        report: ReportKind::Counters,
        line: display_line(line),
    })
}

/// Decode one `service_times` line. Section headers yield `Ok(None)`.
pub fn decode_service_time(line: &str) -> Result<Option<Record>, LineError> {
    SERVICE_TIMES.decode(line)
}

fn is_section_header(line: &str, delimiter: char) -> bool {
    let Some(body) = line.strip_suffix('\n') else {
        return false;
    };
    let body = body.strip_suffix('\r').unwrap_or(body);
    body.ends_with(delimiter)
}

fn sanitize_key(label: &str) -> String {
    label
        .chars()
        .filter(|c| !matches!(c, '(' | ')'))
        .map(|c| if c == ' ' { '_' } else { c })
        .collect()
}

fn display_line(line: &str) -> String {
    line.trim_end_matches(['\r', '\n']).to_string()
}
