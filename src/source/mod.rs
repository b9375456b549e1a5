//! Candidate endpoint sources
//!
//! Candidates come from one of two documents:
//!
//! - the chain registry `chain.json`, with peers under `peers.<type>` and
//!   APIs under `apis.<type>`
//! - a live peer discovery API returning `{"live_peers": ["id@host:port"]}`
//!   (persistent peers only)

mod http;

pub use http::HttpSource;

use crate::address::split_node_id;
use crate::config::ResourceType;
use crate::error::{ConfigError, Result, SourceError};
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

/// One endpoint advertised by a source, immutable once fetched
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Candidate {
    /// Position in the source document (discovery order)
    pub index: usize,
    /// Resource type, decides parsing and probing
    pub kind: ResourceType,
    /// P2P node id, peers only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_id: Option<String>,
    /// Address as advertised (`id@host:port` for peers)
    pub raw_address: String,
}

impl Candidate {
    pub fn new(index: usize, kind: ResourceType, raw_address: impl Into<String>) -> Self {
        let raw_address = raw_address.into();
        let node_id = if kind.is_peer() {
            split_node_id(&raw_address).map(|(id, _)| id.to_string())
        } else {
            None
        };

        Self {
            index,
            kind,
            node_id,
            raw_address,
        }
    }
}

/// Anything that can produce the candidate list for a run
#[async_trait]
pub trait CandidateSource: Send + Sync {
    /// Fetch candidates for `chain`. `alternate` selects the discovery API,
    /// which only serves persistent peers.
    async fn fetch(
        &self,
        chain: &str,
        resource: ResourceType,
        alternate: bool,
    ) -> Result<Vec<Candidate>>;
}

/// Extract candidates of one type from a chain registry document
pub fn candidates_from_registry(
    doc: &Value,
    resource: ResourceType,
) -> std::result::Result<Vec<Candidate>, SourceError> {
    let section = resource.registry_section();
    let entries = doc
        .get(section)
        .ok_or_else(|| SourceError::Malformed(format!("missing key '{}'", section)))?
        .get(resource.as_str())
        .and_then(Value::as_array)
        .ok_or_else(|| {
            SourceError::Malformed(format!("missing list '{}.{}'", section, resource))
        })?;

    entries
        .iter()
        .enumerate()
        .map(|(index, entry)| {
            let address = entry.get("address").and_then(Value::as_str).ok_or_else(|| {
                SourceError::Malformed(format!(
                    "entry {} of '{}.{}' has no 'address'",
                    index, section, resource
                ))
            })?;

            // Peers are stored as separate id/address fields; join them into
            // the `id@host:port` form the parser expects.
            let raw = match entry.get("id").and_then(Value::as_str) {
                Some(id) if resource.is_peer() => format!("{}@{}", id, address),
                _ => address.to_string(),
            };
            Ok(Candidate::new(index, resource, raw))
        })
        .collect()
}

/// Extract persistent peer candidates from a discovery API document
pub fn candidates_from_discovery(
    doc: &Value,
) -> std::result::Result<Vec<Candidate>, SourceError> {
    let peers = doc
        .get("live_peers")
        .and_then(Value::as_array)
        .ok_or_else(|| SourceError::Malformed("missing list 'live_peers'".to_string()))?;

    peers
        .iter()
        .enumerate()
        .map(|(index, peer)| {
            peer.as_str()
                .map(|raw| Candidate::new(index, ResourceType::PersistentPeer, raw))
                .ok_or_else(|| {
                    SourceError::Malformed(format!("live_peers[{}] is not a string", index))
                })
        })
        .collect()
}

/// Reject the discovery API for anything but persistent peers
pub(crate) fn check_alternate(resource: ResourceType, alternate: bool) -> Result<()> {
    if alternate && resource != ResourceType::PersistentPeer {
        return Err(ConfigError::AlternateSourceRequiresPersistentPeers.into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn registry() -> Value {
        json!({
            "chain_name": "osmosis",
            "peers": {
                "seeds": [
                    { "id": "f515a8599b40f0e84dfad935ba414674ab11a668", "address": "osmosis.blockpane.com:26656" },
                    { "id": "ade4d8bc8cbe014af6ebdf3cb7b1e9ad36f412c0", "address": "seeds.polkachu.com:12556" }
                ],
                "persistent_peers": []
            },
            "apis": {
                "rpc": [ { "address": "https://rpc.osmosis.zone", "provider": "Osmosis" } ],
                "rest": [ { "address": "https://lcd.osmosis.zone/" } ],
                "grpc": [ { "address": "grpc.osmosis.zone:9090" } ]
            }
        })
    }

    #[test]
    fn test_registry_peers() {
        let candidates = candidates_from_registry(&registry(), ResourceType::Seed).unwrap();
        assert_eq!(candidates.len(), 2);
        assert_eq!(
            candidates[0].raw_address,
            "f515a8599b40f0e84dfad935ba414674ab11a668@osmosis.blockpane.com:26656"
        );
        assert_eq!(
            candidates[1].node_id.as_deref(),
            Some("ade4d8bc8cbe014af6ebdf3cb7b1e9ad36f412c0")
        );
        assert_eq!(candidates[1].index, 1);

        let empty = candidates_from_registry(&registry(), ResourceType::PersistentPeer).unwrap();
        assert!(empty.is_empty());
    }

    #[test]
    fn test_registry_apis() {
        let rpc = candidates_from_registry(&registry(), ResourceType::Rpc).unwrap();
        assert_eq!(rpc[0].raw_address, "https://rpc.osmosis.zone");
        assert_eq!(rpc[0].node_id, None);

        let grpc = candidates_from_registry(&registry(), ResourceType::Grpc).unwrap();
        assert_eq!(grpc[0].raw_address, "grpc.osmosis.zone:9090");
    }

    #[test]
    fn test_registry_missing_keys() {
        let doc = json!({ "peers": { "seeds": [] } });
        assert!(matches!(
            candidates_from_registry(&doc, ResourceType::Rpc),
            Err(SourceError::Malformed(_))
        ));
        assert!(matches!(
            candidates_from_registry(&doc, ResourceType::PersistentPeer),
            Err(SourceError::Malformed(_))
        ));

        let doc = json!({ "apis": { "grpc": [ { "provider": "nobody" } ] } });
        assert!(matches!(
            candidates_from_registry(&doc, ResourceType::Grpc),
            Err(SourceError::Malformed(_))
        ));
    }

    #[test]
    fn test_peer_without_id_keeps_bare_address() {
        let doc = json!({ "peers": { "seeds": [ { "address": "1.2.3.4:26656" } ] } });
        let candidates = candidates_from_registry(&doc, ResourceType::Seed).unwrap();
        assert_eq!(candidates[0].raw_address, "1.2.3.4:26656");
        assert_eq!(candidates[0].node_id, None);
    }

    #[test]
    fn test_discovery_document() {
        let doc = json!({
            "network": "cosmoshub",
            "live_peers": ["abc@1.2.3.4:26656", "def@5.6.7.8:26656"]
        });
        let candidates = candidates_from_discovery(&doc).unwrap();
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[1].node_id.as_deref(), Some("def"));
        assert_eq!(candidates[1].kind, ResourceType::PersistentPeer);

        assert!(candidates_from_discovery(&json!({ "peers": [] })).is_err());
        assert!(candidates_from_discovery(&json!({ "live_peers": [1] })).is_err());
    }

    #[test]
    fn test_check_alternate() {
        assert!(check_alternate(ResourceType::PersistentPeer, true).is_ok());
        assert!(check_alternate(ResourceType::Seed, false).is_ok());
        assert!(check_alternate(ResourceType::Rpc, true).is_err());
    }
}
