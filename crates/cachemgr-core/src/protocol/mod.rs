//! Cache manager protocol modules.
//!
//! - `request`: the literal `cache_object://` request and its auth token.
//! - `proxy_header`: the PROXY protocol v1 preamble written before a request.
//! - `response`: HTTP/1.0 status line and header parsing.
//! - `report`: line decoders for the `counters` and `service_times` reports.
//!
//! All parsers are panic-free: malformed input is reported as an error
//! value, never by indexing raw buffers.

pub mod proxy_header;
pub mod report;
pub mod request;
pub mod response;
