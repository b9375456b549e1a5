//! Resource types advertised by a chain registry

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kind of endpoint being probed
///
/// Determines where candidates live in the registry document, how their
/// addresses are parsed and which probes apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceType {
    /// P2P seed nodes (`peers.seeds`)
    #[serde(rename = "seeds")]
    Seed,
    /// P2P persistent peers (`peers.persistent_peers`)
    #[serde(rename = "persistent_peers")]
    PersistentPeer,
    /// Tendermint RPC servers (`apis.rpc`)
    Rpc,
    /// REST / LCD servers (`apis.rest`)
    Rest,
    /// gRPC servers (`apis.grpc`)
    Grpc,
}

impl ResourceType {
    /// All resource types, in registry order
    pub const ALL: [ResourceType; 5] = [
        ResourceType::Seed,
        ResourceType::PersistentPeer,
        ResourceType::Rpc,
        ResourceType::Rest,
        ResourceType::Grpc,
    ];

    /// Name used on the command line and as the registry key
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceType::Seed => "seeds",
            ResourceType::PersistentPeer => "persistent_peers",
            ResourceType::Rpc => "rpc",
            ResourceType::Rest => "rest",
            ResourceType::Grpc => "grpc",
        }
    }

    /// P2P peer types carry a node id and produce a peer string file
    pub fn is_peer(&self) -> bool {
        matches!(self, ResourceType::Seed | ResourceType::PersistentPeer)
    }

    /// Top-level registry section holding this type (`peers` or `apis`)
    pub fn registry_section(&self) -> &'static str {
        if self.is_peer() {
            "peers"
        } else {
            "apis"
        }
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceType {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "seeds" | "seed" => Ok(ResourceType::Seed),
            "persistent_peers" | "persistent-peers" => Ok(ResourceType::PersistentPeer),
            "rpc" => Ok(ResourceType::Rpc),
            "rest" | "lcd" => Ok(ResourceType::Rest),
            "grpc" => Ok(ResourceType::Grpc),
            _ => Err(ConfigError::InvalidResourceType(s.to_string())),
        }
    }
}
