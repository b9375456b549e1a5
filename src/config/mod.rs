//! Run configuration
//!
//! [`RunConfig`] is the parameter surface the pipeline accepts. The CLI (or
//! any other front end) translates its flags into a config through
//! [`RunConfig::builder`], which enforces the validity rules before any
//! network activity starts.

mod file;
mod resource;

pub use file::{ConfigFile, PreflightSettings, Settings, SourceSettings};
pub use resource::ResourceType;

use crate::error::{ConfigError, Result};
use std::str::FromStr;
use std::time::Duration;

/// Default chain registry document, `{chain}` is substituted
pub const DEFAULT_REGISTRY_URL: &str =
    "https://raw.githubusercontent.com/cosmos/chain-registry/master/{chain}/chain.json";

/// Default live peer discovery API, `{chain}` is substituted
pub const DEFAULT_DISCOVERY_URL: &str = "https://polkachu.com/api/v1/chains/{chain}/live_peers";

/// Default outbound connectivity check target
pub const DEFAULT_PREFLIGHT_TARGET: &str = "1.1.1.1:443";

/// Default number of candidates probed at once
pub const DEFAULT_CONCURRENCY: usize = 16;

/// Per-probe time bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeTimeouts {
    /// TCP reachability
    pub connect: Duration,
    /// Latency measurement
    pub latency: Duration,
    /// RPC `/status` request
    pub rpc: Duration,
    /// Websocket open + ping/pong
    pub websocket: Duration,
    /// Outbound connectivity check
    pub preflight: Duration,
}

impl Default for ProbeTimeouts {
    fn default() -> Self {
        Self {
            connect: Duration::from_millis(500),
            latency: Duration::from_millis(500),
            rpc: Duration::from_secs(2),
            websocket: Duration::from_millis(500),
            preflight: Duration::from_secs(2),
        }
    }
}

/// Where candidate lists are fetched from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceUrls {
    /// Registry document template
    pub registry: String,
    /// Discovery API template
    pub discovery: String,
}

impl SourceUrls {
    /// Registry document URL for a chain
    pub fn registry_url(&self, chain: &str) -> String {
        self.registry.replace("{chain}", chain)
    }

    /// Discovery API URL for a chain
    pub fn discovery_url(&self, chain: &str) -> String {
        self.discovery.replace("{chain}", chain)
    }
}

impl Default for SourceUrls {
    fn default() -> Self {
        Self {
            registry: DEFAULT_REGISTRY_URL.to_string(),
            discovery: DEFAULT_DISCOVERY_URL.to_string(),
        }
    }
}

/// Output format for the presentation layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

impl FromStr for OutputFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            _ => Err(ConfigError::InvalidFormat(s.to_string())),
        }
    }
}

/// Validated configuration for one run
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Chain identifier (registry directory name)
    pub chain: String,
    /// Resource type to probe
    pub resource: ResourceType,
    /// Use the live peer discovery API instead of the registry
    pub alternate_source: bool,
    /// Keep at most this many successes
    pub max_results: Option<usize>,
    /// Drop RPC successes without a live websocket
    pub require_websocket: bool,
    /// Candidates probed at once
    pub concurrency: usize,
    /// Per-probe timeouts
    pub timeouts: ProbeTimeouts,
    /// Stop issuing probes after this long
    pub deadline: Option<Duration>,
    /// Source URL templates
    pub sources: SourceUrls,
    /// Outbound connectivity check target, `None` disables the check
    pub preflight_target: Option<String>,
}

impl RunConfig {
    /// Create a config builder
    pub fn builder() -> RunConfigBuilder {
        RunConfigBuilder::default()
    }
}

/// Builder for [`RunConfig`]
#[derive(Debug, Clone)]
pub struct RunConfigBuilder {
    chain: Option<String>,
    resource: Option<ResourceType>,
    alternate_source: bool,
    max_results: Option<usize>,
    require_websocket: bool,
    concurrency: usize,
    timeouts: ProbeTimeouts,
    deadline: Option<Duration>,
    sources: SourceUrls,
    preflight_target: Option<String>,
}

impl Default for RunConfigBuilder {
    fn default() -> Self {
        Self {
            chain: None,
            resource: None,
            alternate_source: false,
            max_results: None,
            require_websocket: false,
            concurrency: DEFAULT_CONCURRENCY,
            timeouts: ProbeTimeouts::default(),
            deadline: None,
            sources: SourceUrls::default(),
            preflight_target: Some(DEFAULT_PREFLIGHT_TARGET.to_string()),
        }
    }
}

impl RunConfigBuilder {
    pub fn chain(mut self, chain: impl Into<String>) -> Self {
        self.chain = Some(chain.into());
        self
    }

    pub fn resource(mut self, resource: ResourceType) -> Self {
        self.resource = Some(resource);
        self
    }

    pub fn alternate_source(mut self, enabled: bool) -> Self {
        self.alternate_source = enabled;
        self
    }

    pub fn max_results(mut self, max: Option<usize>) -> Self {
        self.max_results = max;
        self
    }

    pub fn require_websocket(mut self, enabled: bool) -> Self {
        self.require_websocket = enabled;
        self
    }

    pub fn concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    pub fn timeouts(mut self, timeouts: ProbeTimeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    pub fn deadline(mut self, deadline: Option<Duration>) -> Self {
        self.deadline = deadline;
        self
    }

    pub fn sources(mut self, sources: SourceUrls) -> Self {
        self.sources = sources;
        self
    }

    pub fn preflight_target(mut self, target: Option<String>) -> Self {
        self.preflight_target = target;
        self
    }

    /// Apply settings from a config file; explicit builder calls made
    /// afterwards take precedence
    pub fn apply_file(mut self, file: &ConfigFile) -> Self {
        self.concurrency = file.settings.concurrency;
        self.timeouts = file.settings.timeouts();
        self.sources = file.sources.urls();
        self.preflight_target = file.preflight.target();
        self
    }

    /// Validate and build the config
    pub fn build(self) -> Result<RunConfig> {
        let chain = self
            .chain
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingField("chain".to_string()))?;
        let resource = self
            .resource
            .ok_or_else(|| ConfigError::MissingField("resource type".to_string()))?;

        if self.alternate_source && resource != ResourceType::PersistentPeer {
            return Err(ConfigError::AlternateSourceRequiresPersistentPeers.into());
        }
        if self.require_websocket && resource != ResourceType::Rpc {
            return Err(ConfigError::WebsocketFilterRequiresRpc.into());
        }
        if self.concurrency == 0 {
            return Err(ConfigError::InvalidConcurrency.into());
        }

        Ok(RunConfig {
            chain,
            resource,
            alternate_source: self.alternate_source,
            max_results: self.max_results,
            require_websocket: self.require_websocket,
            concurrency: self.concurrency,
            timeouts: self.timeouts,
            deadline: self.deadline,
            sources: self.sources,
            preflight_target: self.preflight_target,
        })
    }
}
