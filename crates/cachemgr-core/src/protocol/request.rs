//! Request encoder for the `cache_object://` pseudo-HTTP/1.0 interface.

use base64::prelude::BASE64_STANDARD;
use base64::Engine;
use bytes::{BufMut, Bytes, BytesMut};

/// Default `User-Agent`; the cache manager treats it as a squidclient peer.
pub const DEFAULT_USER_AGENT: &str = "squidclient/3.5.12";

/// Build the basic-auth token for `Proxy-Authorization`.
///
/// Returns `None` for an empty login (no header is sent).
pub fn basic_auth_token(login: &str, password: &str) -> Option<String> {
    if login.is_empty() {
        return None;
    }
    Some(BASE64_STANDARD.encode(format!("{login}:{password}")))
}

/// Encode the request for `endpoint` as CRLF-joined bytes.
pub fn encode_request(endpoint: &str, user_agent: &str, auth_token: Option<&str>) -> Bytes {
    let mut buf = BytesMut::with_capacity(160);
    put_line(&mut buf, &format!("GET cache_object://localhost/{endpoint} HTTP/1.0"));
    put_line(&mut buf, "Host: localhost");
    put_line(&mut buf, &format!("User-Agent: {user_agent}"));
    if let Some(token) = auth_token.filter(|t| !t.is_empty()) {
        put_line(&mut buf, &format!("Proxy-Authorization: Basic {token}"));
    }
    put_line(&mut buf, "Accept: */*");
    buf.put_slice(b"\r\n");
    buf.freeze()
}

fn put_line(buf: &mut BytesMut, line: &str) {
    buf.put_slice(line.as_bytes());
    buf.put_slice(b"\r\n");
}
