//! Shared application state for the exporter.

use std::sync::Arc;
use std::time::Instant;

use cachemgr_core::error::Result;
use cachemgr_core::protocol::report::ReportKind;
use cachemgr_core::FetchOutcome;

use crate::client::{CacheManagerClient, CacheObjectClient, ClientConfig};
use crate::config::ExporterConfig;
use crate::obs::metrics::ExporterMetrics;

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
    client: Arc<dyn CacheManagerClient>,
}

struct AppStateInner {
    cfg: ExporterConfig,
    metrics: ExporterMetrics,
}

impl AppState {
    /// Build state with a TCP client for the configured cache manager.
    pub fn new(cfg: ExporterConfig) -> Result<Self> {
        cfg.validate()?;
        let client_cfg = ClientConfig::from_section(&cfg.cachemgr);

        tracing::info!(
            host = %client_cfg.hostname,
            port = client_cfg.port,
            auth = client_cfg.auth_token.is_some(),
            proxy_header = client_cfg.proxy_header.is_some(),
            fetch_timeout_ms = ?cfg.cachemgr.fetch_timeout_ms,
            "cache manager target"
        );

        Ok(Self::with_client(cfg, Arc::new(CacheObjectClient::new(client_cfg))))
    }

    /// Build state around any report source (tests inject fakes here).
    pub fn with_client(cfg: ExporterConfig, client: Arc<dyn CacheManagerClient>) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                cfg,
                metrics: ExporterMetrics::default(),
            }),
            client,
        }
    }

    pub fn cfg(&self) -> &ExporterConfig {
        &self.inner.cfg
    }

    pub fn metrics(&self) -> &ExporterMetrics {
        &self.inner.metrics
    }

    /// Fetch one report and account it in self-metrics.
    pub async fn fetch(&self, report: ReportKind) -> Result<FetchOutcome> {
        let started = Instant::now();
        let res = self.client.fetch(report).await;
        self.metrics().record_fetch(report, &res, started.elapsed());
        res
    }
}
