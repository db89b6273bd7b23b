//! Client tests against an in-process fake cache manager.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use cachemgr_core::{CacheMgrError, ErrorKind, Record};
use cachemgr_exporter::client::{CacheManagerClient, CacheObjectClient, ClientConfig};

/// Accept one connection, capture the request, reply with `response`, close.
async fn fake_cachemgr(response: &'static [u8]) -> (u16, JoinHandle<Vec<u8>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    let handle = tokio::spawn(async move {
        let (mut sock, _) = listener.accept().await.unwrap();
        let mut seen = Vec::new();
        let mut buf = [0u8; 1024];
        while !seen.windows(4).any(|w| w == b"\r\n\r\n") {
            let n = sock.read(&mut buf).await.unwrap();
            if n == 0 {
                break;
            }
            seen.extend_from_slice(&buf[..n]);
        }
        sock.write_all(response).await.unwrap();
        sock.shutdown().await.unwrap();
        seen
    });

    (port, handle)
}

#[tokio::test]
async fn counters_end_to_end() {
    let (port, server) = fake_cachemgr(b"HTTP/1.0 200 OK\r\nServer: squid\r\n\r\na = 1\nb = 2\n").await;
    let client = CacheObjectClient::new(ClientConfig::new("127.0.0.1", port));

    let out = client.get_counters().await.unwrap();
    assert_eq!(out.records, vec![Record::new("a", 1.0), Record::new("b", 2.0)]);
    assert!(out.skipped.is_empty());
    assert!(out.is_complete());

    let request = server.await.unwrap();
    assert_eq!(
        String::from_utf8(request).unwrap(),
        "GET cache_object://localhost/counters HTTP/1.0\r\n\
Host: localhost\r\n\
User-Agent: squidclient/3.5.12\r\n\
Accept: */*\r\n\
\r\n"
    );
}

#[tokio::test]
async fn preamble_and_auth_precede_request() {
    let (port, server) = fake_cachemgr(b"HTTP/1.0 200 OK\r\n\r\n").await;
    let cfg = ClientConfig::new("127.0.0.1", port)
        .with_credentials("admin", "s3cret")
        .with_proxy_header();
    let client = CacheObjectClient::new(cfg);

    let out = client.get_service_times().await.unwrap();
    assert!(out.records.is_empty());

    let request = String::from_utf8(server.await.unwrap()).unwrap();
    let expected_preamble = format!("PROXY TCP4 127.0.0.1 127.0.0.1 80 {port}\r\n");
    assert!(request.starts_with(&expected_preamble), "request={request:?}");
    let rest = &request[expected_preamble.len()..];
    assert!(rest.starts_with("GET cache_object://localhost/service_times HTTP/1.0\r\n"));
    assert!(rest.contains("\r\nProxy-Authorization: Basic YWRtaW46czNjcmV0\r\n"));
}

#[tokio::test]
async fn service_times_with_headers_and_garbage() {
    let (port, _server) = fake_cachemgr(
        b"HTTP/1.0 200 OK\r\nContent-Type: text/plain\r\n\r\n\
Service Time Percentiles            5 min    60 min:\n\
HTTP Requests (All):   5%   0.00091   0.00120\n\
??\n\
DNS Lookups:  50%   0.0045   0.0050\n",
    )
    .await;
    let client = CacheObjectClient::new(ClientConfig::new("127.0.0.1", port));

    let out = client.get_service_times().await.unwrap();
    assert_eq!(
        out.records,
        vec![
            Record::new("HTTP_Requests_All_5", 0.00091),
            Record::new("DNS_Lookups_50", 0.0045),
        ]
    );
    assert_eq!(out.skipped.len(), 1);
}

#[tokio::test]
async fn content_length_bounds_body() {
    let (port, _server) =
        fake_cachemgr(b"HTTP/1.0 200 OK\r\nContent-Length: 6\r\n\r\na = 1\nb = 2\n").await;
    let client = CacheObjectClient::new(ClientConfig::new("127.0.0.1", port));

    let out = client.get_counters().await.unwrap();
    assert_eq!(out.records, vec![Record::new("a", 1.0)]);
}

#[tokio::test]
async fn short_body_is_reported_as_truncated() {
    let (port, _server) =
        fake_cachemgr(b"HTTP/1.0 200 OK\r\nContent-Length: 100\r\n\r\na = 1\nb = 2\n").await;
    let client = CacheObjectClient::new(ClientConfig::new("127.0.0.1", port));

    let out = client.get_counters().await.unwrap();
    assert_eq!(out.records, vec![Record::new("a", 1.0), Record::new("b", 2.0)]);
    assert!(!out.is_complete());
    let err = out.stream_error.unwrap();
    assert!(err.contains("88 bytes short"), "stream_error={err}");
}

#[tokio::test]
async fn exact_content_length_is_complete() {
    let (port, _server) =
        fake_cachemgr(b"HTTP/1.0 200 OK\r\nContent-Length: 12\r\n\r\na = 1\nb = 2\n").await;
    let client = CacheObjectClient::new(ClientConfig::new("127.0.0.1", port));

    let out = client.get_counters().await.unwrap();
    assert_eq!(out.records.len(), 2);
    assert!(out.is_complete());
}

#[tokio::test]
async fn non_success_status_is_fatal() {
    let (port, _server) =
        fake_cachemgr(b"HTTP/1.0 407 Proxy Authentication Required\r\n\r\nnope = 1\n").await;
    let client = CacheObjectClient::new(ClientConfig::new("127.0.0.1", port));

    match client.get_counters().await {
        Err(CacheMgrError::NonSuccessStatus(407)) => {}
        other => panic!("unexpected: {other:?}"),
    }
}

#[tokio::test]
async fn truncated_head_is_protocol_error() {
    let (port, _server) = fake_cachemgr(b"HTTP/1.0 200 OK\r\nServer: squid\r\n").await;
    let client = CacheObjectClient::new(ClientConfig::new("127.0.0.1", port));

    let err = client.get_counters().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Protocol);
}

#[tokio::test]
async fn refused_connection_is_connection_error() {
    let port = {
        let l = TcpListener::bind("127.0.0.1:0").await.unwrap();
        l.local_addr().unwrap().port()
    };
    let client = CacheObjectClient::new(ClientConfig::new("127.0.0.1", port));

    let err = client.get_counters().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Connection);
}

#[tokio::test]
async fn deadline_bounds_stalled_peer() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let _server = tokio::spawn(async move {
        let (sock, _) = listener.accept().await.unwrap();
        tokio::time::sleep(Duration::from_secs(30)).await;
        drop(sock);
    });

    let cfg = ClientConfig::new("127.0.0.1", port).with_fetch_timeout(Duration::from_millis(200));
    let client = CacheObjectClient::new(cfg);

    match client.get_counters().await {
        Err(CacheMgrError::Timeout(d)) => assert_eq!(d, Duration::from_millis(200)),
        other => panic!("unexpected: {other:?}"),
    }
}

#[tokio::test]
async fn independent_fetches_run_concurrently() {
    let (p1, _s1) = fake_cachemgr(b"HTTP/1.0 200 OK\r\n\r\nx = 1\n").await;
    let (p2, _s2) = fake_cachemgr(b"HTTP/1.0 200 OK\r\n\r\nDNS Lookups: 0.5\n").await;
    let c1 = CacheObjectClient::new(ClientConfig::new("127.0.0.1", p1));
    let c2 = CacheObjectClient::new(ClientConfig::new("127.0.0.1", p2));

    let (a, b) = tokio::join!(c1.get_counters(), c2.get_service_times());
    assert_eq!(a.unwrap().records, vec![Record::new("x", 1.0)]);
    assert_eq!(b.unwrap().records, vec![Record::new("DNS_Lookups", 0.5)]);
}
