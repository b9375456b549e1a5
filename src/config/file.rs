//! Configuration file handling

use super::{
    ProbeTimeouts, SourceUrls, DEFAULT_CONCURRENCY, DEFAULT_DISCOVERY_URL,
    DEFAULT_PREFLIGHT_TARGET, DEFAULT_REGISTRY_URL,
};
use crate::error::{ConfigError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Configuration file structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    /// Probe settings
    #[serde(default)]
    pub settings: Settings,

    /// Candidate sources
    #[serde(default)]
    pub sources: SourceSettings,

    /// Outbound connectivity check
    #[serde(default)]
    pub preflight: PreflightSettings,
}

/// Probe settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Candidates probed at once
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// TCP reachability timeout in milliseconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_ms: u64,

    /// Latency probe timeout in milliseconds
    #[serde(default = "default_latency_timeout")]
    pub latency_timeout_ms: u64,

    /// RPC `/status` timeout in milliseconds
    #[serde(default = "default_rpc_timeout")]
    pub rpc_timeout_ms: u64,

    /// Websocket probe timeout in milliseconds
    #[serde(default = "default_websocket_timeout")]
    pub websocket_timeout_ms: u64,
}

fn default_concurrency() -> usize {
    DEFAULT_CONCURRENCY
}

fn default_connect_timeout() -> u64 {
    500
}

fn default_latency_timeout() -> u64 {
    500
}

fn default_rpc_timeout() -> u64 {
    2_000
}

fn default_websocket_timeout() -> u64 {
    500
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            connect_timeout_ms: default_connect_timeout(),
            latency_timeout_ms: default_latency_timeout(),
            rpc_timeout_ms: default_rpc_timeout(),
            websocket_timeout_ms: default_websocket_timeout(),
        }
    }
}

impl Settings {
    /// Convert to runtime timeouts
    pub fn timeouts(&self) -> ProbeTimeouts {
        ProbeTimeouts {
            connect: Duration::from_millis(self.connect_timeout_ms),
            latency: Duration::from_millis(self.latency_timeout_ms),
            rpc: Duration::from_millis(self.rpc_timeout_ms),
            websocket: Duration::from_millis(self.websocket_timeout_ms),
            ..ProbeTimeouts::default()
        }
    }
}

/// Candidate source URL templates (`{chain}` is substituted)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceSettings {
    #[serde(default = "default_registry_url")]
    pub registry_url: String,

    #[serde(default = "default_discovery_url")]
    pub discovery_url: String,
}

fn default_registry_url() -> String {
    DEFAULT_REGISTRY_URL.to_string()
}

fn default_discovery_url() -> String {
    DEFAULT_DISCOVERY_URL.to_string()
}

impl Default for SourceSettings {
    fn default() -> Self {
        Self {
            registry_url: default_registry_url(),
            discovery_url: default_discovery_url(),
        }
    }
}

impl SourceSettings {
    /// Convert to runtime source URLs
    pub fn urls(&self) -> SourceUrls {
        SourceUrls {
            registry: self.registry_url.clone(),
            discovery: self.discovery_url.clone(),
        }
    }
}

/// Outbound connectivity check
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreflightSettings {
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// `host:port` reached over TCP
    #[serde(default = "default_preflight_target")]
    pub target: String,
}

fn default_enabled() -> bool {
    true
}

fn default_preflight_target() -> String {
    DEFAULT_PREFLIGHT_TARGET.to_string()
}

impl Default for PreflightSettings {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            target: default_preflight_target(),
        }
    }
}

impl PreflightSettings {
    /// Effective target, `None` when the check is disabled
    pub fn target(&self) -> Option<String> {
        self.enabled.then(|| self.target.clone())
    }
}

impl ConfigFile {
    /// Get the default config file path
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("chain-registry-query")
            .join("config.toml")
    }

    /// Load from default path
    pub fn load_default() -> Result<Option<Self>> {
        let path = Self::default_path();
        if path.exists() {
            Ok(Some(Self::load(&path)?))
        } else {
            Ok(None)
        }
    }

    /// Load from a specific path
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::InvalidFile(format!("{}: {}", path.display(), e)))?;

        let config: Self = toml::from_str(&content).map_err(ConfigError::from)?;
        Ok(config)
    }
}
