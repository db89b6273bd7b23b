use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};

use serde::Deserialize;

use cachemgr_core::error::{CacheMgrError, Result};
use cachemgr_core::protocol::proxy_header::{DEFAULT_DESTINATION_IP, DEFAULT_SOURCE};
use cachemgr_core::protocol::request::DEFAULT_USER_AGENT;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExporterConfig {
    pub version: u32,

    #[serde(default)]
    pub exporter: ExporterSection,

    #[serde(default)]
    pub cachemgr: CacheMgrSection,
}

impl ExporterConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(CacheMgrError::UnsupportedVersion);
        }

        self.exporter.validate()?;
        self.cachemgr.validate()?;

        Ok(())
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExporterSection {
    #[serde(default = "default_listen")]
    pub listen: String,
}

impl Default for ExporterSection {
    fn default() -> Self {
        Self {
            listen: default_listen(),
        }
    }
}

impl ExporterSection {
    pub fn validate(&self) -> Result<()> {
        self.listen.parse::<SocketAddr>().map_err(|_| {
            CacheMgrError::BadConfig(format!(
                "exporter.listen must be a socket address, got {:?}",
                self.listen
            ))
        })?;
        Ok(())
    }
}

fn default_listen() -> String {
    "0.0.0.0:9301".into()
}

/// Target cache manager and protocol knobs.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CacheMgrSection {
    #[serde(default = "default_hostname")]
    pub hostname: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Empty login disables `Proxy-Authorization`.
    #[serde(default)]
    pub login: String,

    #[serde(default)]
    pub password: String,

    /// Send a PROXY v1 preamble before the request.
    #[serde(default)]
    pub proxy_header: bool,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    #[serde(default = "default_proxy_source")]
    pub proxy_source: SocketAddrV4,

    #[serde(default = "default_proxy_destination_ip")]
    pub proxy_destination_ip: Ipv4Addr,

    /// Unset means a fetch waits on the peer indefinitely.
    #[serde(default)]
    pub fetch_timeout_ms: Option<u64>,
}

impl Default for CacheMgrSection {
    fn default() -> Self {
        Self {
            hostname: default_hostname(),
            port: default_port(),
            login: String::new(),
            password: String::new(),
            proxy_header: false,
            user_agent: default_user_agent(),
            proxy_source: default_proxy_source(),
            proxy_destination_ip: default_proxy_destination_ip(),
            fetch_timeout_ms: None,
        }
    }
}

impl CacheMgrSection {
    pub fn validate(&self) -> Result<()> {
        if self.hostname.trim().is_empty() {
            return Err(CacheMgrError::BadConfig(
                "cachemgr.hostname must not be empty".into(),
            ));
        }
        if self.port == 0 {
            return Err(CacheMgrError::BadConfig("cachemgr.port must not be 0".into()));
        }
        if self.login.is_empty() && !self.password.is_empty() {
            return Err(CacheMgrError::BadConfig(
                "cachemgr.password is set but cachemgr.login is empty".into(),
            ));
        }
        if self.user_agent.trim().is_empty() || self.user_agent.contains(['\r', '\n']) {
            return Err(CacheMgrError::BadConfig(
                "cachemgr.user_agent must be a non-empty single line".into(),
            ));
        }
        if let Some(ms) = self.fetch_timeout_ms {
            if !(100..=600_000).contains(&ms) {
                return Err(CacheMgrError::BadConfig(
                    "cachemgr.fetch_timeout_ms must be between 100 and 600000".into(),
                ));
            }
        }
        Ok(())
    }

    /// Apply `CACHEMGR_HOSTNAME`, `CACHEMGR_PORT`, `CACHEMGR_LOGIN`,
    /// `CACHEMGR_PASSWORD`, `CACHEMGR_PROXY_HEADER`.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("CACHEMGR_HOSTNAME") {
            self.hostname = v;
        }
        if let Some(v) = lookup("CACHEMGR_PORT") {
            self.port = v.trim().parse().map_err(|_| {
                CacheMgrError::BadConfig(format!("CACHEMGR_PORT is not a port: {v:?}"))
            })?;
        }
        if let Some(v) = lookup("CACHEMGR_LOGIN") {
            self.login = v;
        }
        if let Some(v) = lookup("CACHEMGR_PASSWORD") {
            self.password = v;
        }
        if let Some(v) = lookup("CACHEMGR_PROXY_HEADER") {
            self.proxy_header = match v.trim().to_ascii_lowercase().as_str() {
                "true" | "1" => true,
                "false" | "0" => false,
                _ => {
                    return Err(CacheMgrError::BadConfig(format!(
                        "CACHEMGR_PROXY_HEADER must be true/false/1/0, got {v:?}"
                    )))
                }
            };
        }
        Ok(())
    }
}

fn default_hostname() -> String {
    "localhost".into()
}
fn default_port() -> u16 {
    3128
}
fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.into()
}
fn default_proxy_source() -> SocketAddrV4 {
    DEFAULT_SOURCE
}
fn default_proxy_destination_ip() -> Ipv4Addr {
    DEFAULT_DESTINATION_IP
}
