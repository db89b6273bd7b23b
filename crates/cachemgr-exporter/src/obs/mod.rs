//! In-process self-metrics for the exporter.
//!
//! These describe the exporter's own fetch activity (counts, skipped lines,
//! durations). Report records are never rendered here.

pub mod metrics;
