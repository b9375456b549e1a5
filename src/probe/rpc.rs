//! RPC liveness chain
//!
//! The `/status` call decides the candidate. Latency and websocket probes
//! only enrich a successful result and can never fail it.

use super::{
    measure_latency, normalize, round_ms, FailureReason, Probe, ProbeOutcome, ProbeResult,
    RpcMeta, Transport, WsStatus,
};
use crate::address::NormalizedAddress;
use crate::config::ProbeTimeouts;
use crate::source::Candidate;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;

/// Queries `{scheme}://{host}:{port}/status`, then measures latency and
/// websocket availability
pub struct RpcProbe {
    transport: Arc<dyn Transport>,
    timeouts: ProbeTimeouts,
}

impl RpcProbe {
    pub fn new(transport: Arc<dyn Transport>, timeouts: ProbeTimeouts) -> Self {
        Self {
            transport,
            timeouts,
        }
    }

    async fn websocket(&self, address: &NormalizedAddress) -> WsStatus {
        let url = websocket_url(address);
        if self
            .transport
            .websocket_ping(&url, self.timeouts.websocket)
            .await
        {
            WsStatus::Available
        } else {
            tracing::debug!("No websocket pong from {}", url);
            WsStatus::NotApplicable
        }
    }
}

#[async_trait]
impl Probe for RpcProbe {
    async fn probe(&self, candidate: &Candidate) -> ProbeResult {
        let address = match normalize(candidate) {
            Ok(address) => address,
            Err(failed) => return failed,
        };

        let url = format!("{}/status", address.base_url());
        let start = Instant::now();
        let meta = match self.transport.rpc_status(&url, self.timeouts.rpc).await {
            Ok(meta) => meta,
            Err(failure) => {
                tracing::debug!("{} failed: {:?}", url, failure);
                return ProbeResult::new(
                    candidate,
                    Some(address),
                    ProbeOutcome::Failure(FailureReason::ProtocolError {
                        status_code: failure.status_code,
                    }),
                );
            }
        };
        let elapsed = start.elapsed();

        let (latency, ws_status) = tokio::join!(
            measure_latency(self.transport.as_ref(), &address, self.timeouts.latency),
            self.websocket(&address),
        );

        let mut result =
            ProbeResult::new(candidate, Some(address), ProbeOutcome::Success(round_ms(elapsed)));
        result.latency_ms = Some(latency);
        result.rpc_meta = Some(meta);
        result.ws_status = Some(ws_status);
        result
    }
}

/// `wss://host:443/websocket` for TLS endpoints, `ws://host:port/websocket`
/// otherwise
pub fn websocket_url(address: &NormalizedAddress) -> String {
    let scheme = if address.port == 443 { "wss" } else { "ws" };
    format!("{}://{}/websocket", scheme, address.authority())
}

/// Extract liveness metadata from a `/status` document
///
/// Accepts both the JSON-RPC envelope (`{"result": {...}}`) and a bare
/// result object. `tx_index` and `catching_up` are required; a missing
/// `validator_info.voting_power` reads as `"0"`.
pub fn parse_status(doc: &Value) -> Option<RpcMeta> {
    let result = doc.get("result").unwrap_or(doc);

    let tx_indexing = match result.pointer("/node_info/other/tx_index")? {
        Value::String(s) => s == "on",
        Value::Bool(b) => *b,
        _ => return None,
    };
    let catching_up = result.pointer("/sync_info/catching_up")?.as_bool()?;
    let voting_power = match result.pointer("/validator_info/voting_power") {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => "0".to_string(),
    };

    Some(RpcMeta {
        tx_indexing,
        catching_up,
        voting_power,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ResourceType;
    use crate::probe::testing::FakeTransport;
    use crate::probe::ProtocolFailure;
    use serde_json::json;
    use std::time::Duration;

    fn status_doc() -> Value {
        json!({
            "jsonrpc": "2.0",
            "id": -1,
            "result": {
                "node_info": { "network": "osmosis-1", "other": { "tx_index": "on", "rpc_address": "tcp://0.0.0.0:26657" } },
                "sync_info": { "latest_block_height": "12345", "catching_up": false },
                "validator_info": { "address": "ABC", "voting_power": "12" }
            }
        })
    }

    fn meta(voting_power: &str) -> RpcMeta {
        RpcMeta {
            tx_indexing: true,
            catching_up: false,
            voting_power: voting_power.to_string(),
        }
    }

    #[test]
    fn test_parse_status() {
        assert_eq!(parse_status(&status_doc()), Some(meta("12")));
    }

    #[test]
    fn test_missing_voting_power_defaults_to_zero() {
        let mut doc = status_doc();
        doc["result"]["validator_info"]
            .as_object_mut()
            .unwrap()
            .remove("voting_power");
        assert_eq!(parse_status(&doc), Some(meta("0")));

        doc["result"].as_object_mut().unwrap().remove("validator_info");
        assert_eq!(parse_status(&doc), Some(meta("0")));
    }

    #[test]
    fn test_parse_status_bare_result() {
        let doc = json!({
            "node_info": { "other": { "tx_index": "off" } },
            "sync_info": { "catching_up": true },
            "validator_info": { "voting_power": 0 }
        });
        let parsed = parse_status(&doc).unwrap();
        assert!(!parsed.tx_indexing);
        assert!(parsed.catching_up);
        assert_eq!(parsed.voting_power, "0");
    }

    #[test]
    fn test_parse_status_missing_required() {
        assert_eq!(parse_status(&json!({ "result": {} })), None);
        assert_eq!(
            parse_status(&json!({ "result": { "node_info": { "other": { "tx_index": "on" } } } })),
            None
        );
    }

    #[test]
    fn test_websocket_url() {
        assert_eq!(
            websocket_url(&NormalizedAddress::new("rpc.example.com", 443)),
            "wss://rpc.example.com:443/websocket"
        );
        assert_eq!(
            websocket_url(&NormalizedAddress::new("10.0.0.1", 26657)),
            "ws://10.0.0.1:26657/websocket"
        );
        assert_eq!(
            websocket_url(&NormalizedAddress::new("2001:db8::1", 443)),
            "wss://[2001:db8::1]:443/websocket"
        );
    }

    #[tokio::test]
    async fn test_rpc_success_with_websocket() {
        let mut transport =
            FakeTransport::default().reachable("rpc.example.com", Duration::from_millis(20));
        transport.status.insert(
            "https://rpc.example.com:443/status".to_string(),
            Ok(meta("0")),
        );
        transport
            .websockets
            .push("wss://rpc.example.com:443/websocket".to_string());

        let probe = RpcProbe::new(Arc::new(transport), ProbeTimeouts::default());
        let candidate = Candidate::new(0, ResourceType::Rpc, "https://rpc.example.com/");
        let result = probe.probe(&candidate).await;

        assert!(result.is_success());
        assert_eq!(result.latency_ms, Some(20.0));
        assert_eq!(result.rpc_meta, Some(meta("0")));
        assert_eq!(result.ws_status, Some(WsStatus::Available));
    }

    #[tokio::test]
    async fn test_rpc_without_ping_or_websocket_still_succeeds() {
        let mut transport = FakeTransport::default();
        transport.status.insert(
            "http://10.0.0.1:26657/status".to_string(),
            Ok(meta("5")),
        );

        let probe = RpcProbe::new(Arc::new(transport), ProbeTimeouts::default());
        let candidate = Candidate::new(0, ResourceType::Rpc, "http://10.0.0.1:26657");
        let result = probe.probe(&candidate).await;

        assert!(result.is_success());
        assert_eq!(result.latency_ms, Some(0.0));
        assert_eq!(result.ws_status, Some(WsStatus::NotApplicable));
    }

    #[tokio::test]
    async fn test_rpc_protocol_errors() {
        let mut transport = FakeTransport::default();
        transport.status.insert(
            "https://bad.example:443/status".to_string(),
            Err(ProtocolFailure {
                status_code: Some(503),
            }),
        );
        let probe = RpcProbe::new(Arc::new(transport), ProbeTimeouts::default());

        let bad = Candidate::new(0, ResourceType::Rpc, "https://bad.example");
        let result = probe.probe(&bad).await;
        assert_eq!(
            result.failure_reason(),
            Some(FailureReason::ProtocolError {
                status_code: Some(503)
            })
        );
        assert_eq!(result.ws_status, None);

        let silent = Candidate::new(1, ResourceType::Rpc, "https://silent.example");
        let result = probe.probe(&silent).await;
        assert_eq!(
            result.failure_reason().map(|r| r.to_string()).as_deref(),
            Some("request failed")
        );
    }
}
