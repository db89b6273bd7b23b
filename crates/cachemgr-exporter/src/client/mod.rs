//! Cache manager client.
//!
//! Each fetch dials a fresh TCP connection, optionally writes the PROXY v1
//! preamble, sends the `cache_object://` request, validates the response
//! head, then decodes the body line by line. Nothing is carried between
//! fetches, so one client can serve concurrent fetches.

pub mod exchange;
pub mod lines;

use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::net::TcpStream;

use cachemgr_core::error::{CacheMgrError, Result};
use cachemgr_core::protocol::proxy_header::ProxyHeaderV1;
use cachemgr_core::protocol::report::ReportKind;
use cachemgr_core::protocol::request::{basic_auth_token, DEFAULT_USER_AGENT};
use cachemgr_core::FetchOutcome;

use crate::config::CacheMgrSection;

/// Report source used by the HTTP layer.
#[async_trait]
pub trait CacheManagerClient: Send + Sync {
    async fn fetch(&self, report: ReportKind) -> Result<FetchOutcome>;

    async fn get_counters(&self) -> Result<FetchOutcome> {
        self.fetch(ReportKind::Counters).await
    }

    async fn get_service_times(&self) -> Result<FetchOutcome> {
        self.fetch(ReportKind::ServiceTimes).await
    }
}

/// Immutable connection settings.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub hostname: String,
    pub port: u16,
    /// Base64 of `login:password`.
    pub auth_token: Option<String>,
    /// Preamble written before the request, when enabled.
    pub proxy_header: Option<ProxyHeaderV1>,
    pub user_agent: String,
    pub fetch_timeout: Option<Duration>,
}

impl ClientConfig {
    /// Plain settings: no auth, no preamble, no deadline.
    pub fn new(hostname: impl Into<String>, port: u16) -> Self {
        Self {
            hostname: hostname.into(),
            port,
            auth_token: None,
            proxy_header: None,
            user_agent: DEFAULT_USER_AGENT.into(),
            fetch_timeout: None,
        }
    }

    pub fn from_section(s: &CacheMgrSection) -> Self {
        let proxy_header = s.proxy_header.then(|| {
            ProxyHeaderV1::new(
                s.proxy_source,
                std::net::SocketAddrV4::new(s.proxy_destination_ip, s.port),
            )
        });

        Self {
            hostname: s.hostname.clone(),
            port: s.port,
            auth_token: basic_auth_token(&s.login, &s.password),
            proxy_header,
            user_agent: s.user_agent.clone(),
            fetch_timeout: s.fetch_timeout_ms.map(Duration::from_millis),
        }
    }

    pub fn with_credentials(mut self, login: &str, password: &str) -> Self {
        self.auth_token = basic_auth_token(login, password);
        self
    }

    pub fn with_proxy_header(mut self) -> Self {
        self.proxy_header = Some(ProxyHeaderV1::for_port(self.port));
        self
    }

    pub fn with_fetch_timeout(mut self, limit: Duration) -> Self {
        self.fetch_timeout = Some(limit);
        self
    }
}

/// TCP client for the cache manager interface.
#[derive(Debug, Clone)]
pub struct CacheObjectClient {
    cfg: ClientConfig,
}

impl CacheObjectClient {
    pub fn new(cfg: ClientConfig) -> Self {
        Self { cfg }
    }

    async fn fetch_once(&self, report: ReportKind) -> Result<FetchOutcome> {
        let stream = TcpStream::connect((self.cfg.hostname.as_str(), self.cfg.port))
            .await
            .map_err(|source| CacheMgrError::Connect {
                addr: format!("{}:{}", self.cfg.hostname, self.cfg.port),
                source,
            })?;

        let body = exchange::open_report(stream, &self.cfg, report.endpoint()).await?;
        Ok(lines::decode_body(report, body).await)
    }
}

#[async_trait]
impl CacheManagerClient for CacheObjectClient {
    async fn fetch(&self, report: ReportKind) -> Result<FetchOutcome> {
        let started = Instant::now();
        tracing::debug!(report = report.endpoint(), host = %self.cfg.hostname, port = self.cfg.port, "fetch start");

        let res = match self.cfg.fetch_timeout {
            Some(limit) => tokio::time::timeout(limit, self.fetch_once(report))
                .await
                .unwrap_or_else(|_| Err(CacheMgrError::Timeout(limit))),
            None => self.fetch_once(report).await,
        };

        match &res {
            Ok(out) => tracing::debug!(
                report = report.endpoint(),
                records = out.records.len(),
                skipped = out.skipped.len(),
                complete = out.is_complete(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "fetch done"
            ),
            Err(e) => tracing::warn!(
                report = report.endpoint(),
                kind = e.kind().as_str(),
                error = %e,
                "fetch failed"
            ),
        }
        res
    }
}
