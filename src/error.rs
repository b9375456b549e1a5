//! Error types for chain-registry-query
//!
//! Only run-level problems are errors. Per-candidate outcomes (malformed
//! address, unreachable host, broken RPC) are recorded as data in
//! [`crate::probe::ProbeResult`] and never abort a run.

use thiserror::Error;

/// Main error type for the library
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid run configuration, reported before any network activity
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// No outbound connectivity
    #[error("Preflight network check failed: {0}")]
    Preflight(String),

    /// Candidate list could not be fetched or parsed
    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    /// Generic IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Only 'persistent_peers' is valid with the alternate discovery source")]
    AlternateSourceRequiresPersistentPeers,

    #[error("The websocket filter only applies to 'rpc'")]
    WebsocketFilterRequiresRpc,

    #[error(
        "Resource type must be either persistent_peers, seeds, rpc, rest or grpc (got '{0}')"
    )]
    InvalidResourceType(String),

    #[error("Concurrency must be at least 1")]
    InvalidConcurrency,

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Unsupported output format: {0}")]
    InvalidFormat(String),

    #[error("Invalid config file: {0}")]
    InvalidFile(String),

    #[error("Config file parse error: {0}")]
    ParseError(#[from] toml::de::Error),
}

/// Candidate source errors
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("{url} returned HTTP {status}")]
    Unavailable { url: String, status: u16 },

    #[error("Unexpected document shape: {0}")]
    Malformed(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Address normalization errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
    #[error("Malformed address '{raw}': {reason}")]
    Malformed { raw: String, reason: &'static str },
}

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;
