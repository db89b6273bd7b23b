//! cachemgr exporter
//!
//! - Loads `cachemgr.yaml` (or `$CACHEMGR_CONFIG`), strict parsing + env overrides
//! - Serves `/v1/reports[/{report}]` as JSON, `/metrics` for self-metrics
//! - Every request opens a fresh connection to the cache manager

use std::net::SocketAddr;
use tracing_subscriber::{fmt, EnvFilter};

use cachemgr_exporter::{app_state, config, router};

const DEFAULT_CONFIG_PATH: &str = "cachemgr.yaml";

#[tokio::main]
async fn main() {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let path = std::env::var("CACHEMGR_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.into());
    let cfg = config::load_from_file(&path).expect("config load failed");
    let state = app_state::AppState::new(cfg).expect("client setup failed");
    let listen: SocketAddr = state
        .cfg()
        .exporter
        .listen
        .parse()
        .expect("exporter.listen must be a valid SocketAddr");

    let app = router::build_router(state);

    tracing::info!(%listen, config = %path, "cachemgr-exporter starting");
    let listener = tokio::net::TcpListener::bind(listen).await.expect("failed to bind");

    axum::serve(listener, app).await.expect("server failed");
}
