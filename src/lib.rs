//! chain-registry-query - Find live peers and API endpoints for a chain
//!
//! Fetches the peers and API servers a chain advertises in the chain registry
//! (or a live peer discovery API), probes each one for reachability, latency
//! and liveness, and ranks the survivors.
//!
//! # Example
//!
//! ```rust,no_run
//! use chain_registry_query::{Pipeline, ResourceType, RunConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = RunConfig::builder()
//!         .chain("osmosis")
//!         .resource(ResourceType::Rpc)
//!         .max_results(Some(5))
//!         .require_websocket(true)
//!         .build()?;
//!
//!     let report = Pipeline::new(config)?.run().await?;
//!     for result in &report.successes {
//!         println!("{} {} ms", result.display_address(), result.latency());
//!     }
//!     Ok(())
//! }
//! ```

pub mod address;
pub mod aggregate;
pub mod config;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod probe;
pub mod source;

// Re-exports for convenience
pub use address::{NormalizedAddress, Scheme};
pub use aggregate::{aggregate, Aggregate, AggregatePolicy};
pub use config::{
    ConfigFile, OutputFormat, ProbeTimeouts, ResourceType, RunConfig, RunConfigBuilder,
    SourceUrls,
};
pub use error::{AddressError, ConfigError, Error, Result, SourceError};
pub use output::{create_writer, write_peer_file, JsonWriter, OutputWriter, TableWriter};
pub use pipeline::{Pipeline, ProbeProgress, Report, RunStatus};
pub use probe::{
    FailureReason, NetTransport, Probe, ProbeOutcome, ProbeResult, RpcMeta, Transport, WsStatus,
};
pub use source::{Candidate, CandidateSource, HttpSource};
