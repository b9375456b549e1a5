//! Endpoint probing
//!
//! Each candidate runs through a chain of bounded-time probes:
//!
//! ```text
//! Pending -> Reachability -> Latency -> [RPC: Protocol -> Websocket] -> Terminal
//! ```
//!
//! The chain is picked per resource type by [`for_resource`]: P2P peers,
//! REST and gRPC get a [`SocketProbe`] (TCP reachability then latency), RPC
//! servers get an [`RpcProbe`] (`/status` liveness, latency, websocket).
//! All network access goes through the [`Transport`] trait.

mod net;
mod rpc;
mod socket;

pub use net::NetTransport;
pub use rpc::{parse_status, websocket_url, RpcProbe};
pub use socket::SocketProbe;

use crate::address::{self, NormalizedAddress};
use crate::config::{ProbeTimeouts, ResourceType};
use crate::source::Candidate;
use async_trait::async_trait;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Why a candidate failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FailureReason {
    /// Address could not be normalized
    MalformedAddress,
    /// TCP connection refused or timed out
    Reachability,
    /// RPC `/status` answered with an error, an undecodable body, or not at
    /// all (`status_code` is `None` when no response was received)
    ProtocolError { status_code: Option<u16> },
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::MalformedAddress => f.write_str("MalformedAddress"),
            FailureReason::Reachability => f.write_str("Reachability"),
            FailureReason::ProtocolError {
                status_code: Some(code),
            } => write!(f, "Error {}", code),
            FailureReason::ProtocolError { status_code: None } => f.write_str("request failed"),
        }
    }
}

/// Outcome of the deciding probe for a candidate
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum ProbeOutcome {
    /// Probe succeeded; the value is its round trip in milliseconds
    Success(f64),
    /// Probe failed definitively
    Failure(FailureReason),
    /// Host name did not resolve; the candidate is dropped from the report
    Skipped,
}

/// Liveness metadata reported by an RPC `/status` call
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RpcMeta {
    pub tx_indexing: bool,
    pub catching_up: bool,
    /// Defaults to `"0"` when the node redacts it
    pub voting_power: String,
}

/// Websocket availability of an RPC server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WsStatus {
    Available,
    NotApplicable,
}

/// Terminal, write-once result for one candidate
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProbeResult {
    pub candidate: Candidate,
    /// `None` only when the address was malformed
    pub address: Option<NormalizedAddress>,
    pub reachability: ProbeOutcome,
    pub latency_ms: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rpc_meta: Option<RpcMeta>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ws_status: Option<WsStatus>,
}

impl ProbeResult {
    /// Result with only the deciding outcome filled in
    pub fn new(
        candidate: &Candidate,
        address: Option<NormalizedAddress>,
        reachability: ProbeOutcome,
    ) -> Self {
        Self {
            candidate: candidate.clone(),
            address,
            reachability,
            latency_ms: None,
            rpc_meta: None,
            ws_status: None,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.reachability, ProbeOutcome::Success(_))
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self.reachability, ProbeOutcome::Skipped)
    }

    pub fn failure_reason(&self) -> Option<FailureReason> {
        match self.reachability {
            ProbeOutcome::Failure(reason) => Some(reason),
            _ => None,
        }
    }

    /// Latency used for ranking, 0 when none was measured
    pub fn latency(&self) -> f64 {
        self.latency_ms.unwrap_or(0.0)
    }

    /// `host:port`, or the raw address when it could not be parsed
    pub fn display_address(&self) -> String {
        match &self.address {
            Some(address) => address.to_string(),
            None => self.candidate.raw_address.clone(),
        }
    }

    /// `node_id@host:port` for peer results
    pub fn peer_string(&self) -> Option<String> {
        let node_id = self.candidate.node_id.as_ref()?;
        let address = self.address.as_ref()?;
        Some(format!("{}@{}", node_id, address))
    }
}

/// Connection failure classes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectError {
    /// Host name did not resolve
    Dns,
    /// Connection actively refused or reset
    Refused,
    /// No answer within the time bound
    Timeout,
}

/// RPC status failure; `status_code` is `None` when no response arrived
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProtocolFailure {
    pub status_code: Option<u16>,
}

/// Network operations used by the probes
#[async_trait]
pub trait Transport: Send + Sync {
    /// Open (and drop) a TCP connection, returning the handshake time
    async fn connect(
        &self,
        address: &NormalizedAddress,
        timeout: Duration,
    ) -> Result<Duration, ConnectError>;

    /// Round trip to the host, `None` when it does not answer
    async fn round_trip(&self, address: &NormalizedAddress, timeout: Duration)
        -> Option<Duration>;

    /// GET an RPC `/status` document and extract its liveness metadata
    async fn rpc_status(&self, url: &str, timeout: Duration) -> Result<RpcMeta, ProtocolFailure>;

    /// Open a websocket, ping it and wait for the pong
    async fn websocket_ping(&self, url: &str, timeout: Duration) -> bool;
}

/// A probe chain for one resource type
#[async_trait]
pub trait Probe: Send + Sync {
    /// Run every applicable probe against a candidate
    async fn probe(&self, candidate: &Candidate) -> ProbeResult;
}

/// Pick the probe chain for a resource type
pub fn for_resource(
    resource: ResourceType,
    transport: Arc<dyn Transport>,
    timeouts: ProbeTimeouts,
) -> Arc<dyn Probe> {
    match resource {
        ResourceType::Rpc => Arc::new(RpcProbe::new(transport, timeouts)),
        ResourceType::Seed
        | ResourceType::PersistentPeer
        | ResourceType::Rest
        | ResourceType::Grpc => Arc::new(SocketProbe::new(transport, timeouts)),
    }
}

/// Normalize a candidate's address, producing the failed result on error
pub(crate) fn normalize(candidate: &Candidate) -> Result<NormalizedAddress, ProbeResult> {
    address::parse(candidate.kind, &candidate.raw_address).map_err(|e| {
        tracing::debug!("{}", e);
        ProbeResult::new(
            candidate,
            None,
            ProbeOutcome::Failure(FailureReason::MalformedAddress),
        )
    })
}

/// Milliseconds rounded to two decimals
pub fn round_ms(duration: Duration) -> f64 {
    (duration.as_secs_f64() * 1000.0 * 100.0).round() / 100.0
}

/// Latency probe shared by both chains: no answer is recorded as 0
pub(crate) async fn measure_latency(
    transport: &dyn Transport,
    address: &NormalizedAddress,
    timeout: Duration,
) -> f64 {
    match transport.round_trip(address, timeout).await {
        Some(rtt) => round_ms(rtt),
        None => {
            tracing::debug!("{} did not answer the latency probe", address);
            0.0
        }
    }
}
