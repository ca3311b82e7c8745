use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::time::Duration;

use serde::Deserialize;

use miigate_core::error::{RenderError, Result};
use miigate_core::params::payload;

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    pub version: u32,

    #[serde(default)]
    pub gateway: GatewaySection,

    #[serde(default)]
    pub upstream: UpstreamSection,

    /// Absent means nnid lookups are not wired up.
    #[serde(default)]
    pub store: Option<StoreSection>,
}

impl GatewayConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(RenderError::Validation(format!(
                "unsupported config version {}",
                self.version
            )));
        }

        self.gateway.validate()?;
        self.upstream.validate()?;
        if let Some(store) = &self.store {
            store.validate()?;
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GatewaySection {
    #[serde(default = "default_listen")]
    pub listen: String,

    /// `Access-Control-Allow-Origin` value; unset disables CORS headers.
    #[serde(default)]
    pub cors_origin: Option<String>,

    /// Log per-stage render timings.
    #[serde(default)]
    pub timing_log: bool,
}

impl Default for GatewaySection {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            cors_origin: None,
            timing_log: false,
        }
    }
}

impl GatewaySection {
    pub fn validate(&self) -> Result<()> {
        self.listen_addr()?;
        if matches!(self.cors_origin.as_deref(), Some("")) {
            return Err(RenderError::Validation(
                "gateway.cors_origin must not be empty (omit it to disable CORS)".into(),
            ));
        }
        Ok(())
    }

    pub fn listen_addr(&self) -> Result<SocketAddr> {
        self.listen.parse().map_err(|_| {
            RenderError::Validation(format!(
                "gateway.listen must be a valid SocketAddr, got {:?}",
                self.listen
            ))
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpstreamSection {
    #[serde(default = "default_upstream_addr")]
    pub addr: String,

    /// Deadline per backend phase in milliseconds; 0 disables it.
    #[serde(default)]
    pub timeout_ms: u64,
}

impl Default for UpstreamSection {
    fn default() -> Self {
        Self {
            addr: default_upstream_addr(),
            timeout_ms: 0,
        }
    }
}

impl UpstreamSection {
    pub fn validate(&self) -> Result<()> {
        match self.addr.rsplit_once(':') {
            Some((host, port)) if !host.is_empty() && port.parse::<u16>().is_ok() => {}
            _ => {
                return Err(RenderError::Validation(format!(
                    "upstream.addr must be host:port, got {:?}",
                    self.addr
                )))
            }
        }
        if self.timeout_ms != 0 && !(100..=600000).contains(&self.timeout_ms) {
            return Err(RenderError::Validation(
                "upstream.timeout_ms must be 0 or between 100 and 600000".into(),
            ));
        }
        Ok(())
    }

    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_ms > 0).then(|| Duration::from_millis(self.timeout_ms))
    }
}

/// In-config keyed store: nnid -> store data (hex or base64).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StoreSection {
    #[serde(default)]
    pub entries: BTreeMap<String, String>,
}

impl StoreSection {
    pub fn validate(&self) -> Result<()> {
        for (nnid, data) in &self.entries {
            let bytes = payload::decode_store_data(data)
                .map_err(|e| RenderError::Validation(format!("store.entries.{nnid}: {e}")))?;
            payload::check_length(&bytes)
                .map_err(|e| RenderError::Validation(format!("store.entries.{nnid}: {e}")))?;
        }
        Ok(())
    }
}

fn default_listen() -> String {
    "0.0.0.0:5000".into()
}
fn default_upstream_addr() -> String {
    "localhost:12346".into()
}
