//! TCP reachability + latency chain for peers, REST and gRPC

use super::{
    measure_latency, normalize, round_ms, ConnectError, FailureReason, Probe, ProbeOutcome,
    ProbeResult, Transport,
};
use crate::config::ProbeTimeouts;
use crate::source::Candidate;
use async_trait::async_trait;
use std::sync::Arc;

/// Connects to `(host, port)`; on success measures latency
pub struct SocketProbe {
    transport: Arc<dyn Transport>,
    timeouts: ProbeTimeouts,
}

impl SocketProbe {
    pub fn new(transport: Arc<dyn Transport>, timeouts: ProbeTimeouts) -> Self {
        Self {
            transport,
            timeouts,
        }
    }
}

#[async_trait]
impl Probe for SocketProbe {
    async fn probe(&self, candidate: &Candidate) -> ProbeResult {
        let address = match normalize(candidate) {
            Ok(address) => address,
            Err(failed) => return failed,
        };

        let connected = self
            .transport
            .connect(&address, self.timeouts.connect)
            .await;

        let elapsed = match connected {
            Ok(elapsed) => elapsed,
            Err(ConnectError::Dns) => {
                tracing::warn!(
                    "{} did not resolve, dropping {}",
                    address.host,
                    candidate.raw_address
                );
                return ProbeResult::new(candidate, Some(address), ProbeOutcome::Skipped);
            }
            Err(e) => {
                tracing::debug!("{} unreachable: {:?}", address, e);
                return ProbeResult::new(
                    candidate,
                    Some(address),
                    ProbeOutcome::Failure(FailureReason::Reachability),
                );
            }
        };

        let latency =
            measure_latency(self.transport.as_ref(), &address, self.timeouts.latency).await;
        tracing::debug!("{} reachable, latency {} ms", address, latency);

        let mut result =
            ProbeResult::new(candidate, Some(address), ProbeOutcome::Success(round_ms(elapsed)));
        result.latency_ms = Some(latency);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ResourceType;
    use crate::probe::testing::FakeTransport;
    use std::sync::atomic::Ordering;
    use std::time::Duration;

    fn probe(transport: Arc<FakeTransport>) -> SocketProbe {
        SocketProbe::new(transport, ProbeTimeouts::default())
    }

    #[tokio::test]
    async fn test_reachable_peer() {
        let transport =
            Arc::new(FakeTransport::default().reachable("1.2.3.4", Duration::from_micros(12_340)));
        let candidate = Candidate::new(0, ResourceType::Seed, "abc@1.2.3.4:26656");

        let result = probe(transport).probe(&candidate).await;
        assert!(result.is_success());
        assert_eq!(result.latency_ms, Some(12.34));
        assert_eq!(result.rpc_meta, None);
        assert_eq!(result.ws_status, None);
    }

    #[tokio::test]
    async fn test_silent_host_has_zero_latency() {
        let mut transport = FakeTransport::default();
        transport
            .connect
            .insert("grpc.example".to_string(), Ok(Duration::from_millis(5)));
        let candidate = Candidate::new(0, ResourceType::Grpc, "grpc.example:9090");

        let result = probe(Arc::new(transport)).probe(&candidate).await;
        assert!(result.is_success());
        assert_eq!(result.latency_ms, Some(0.0));
    }

    #[tokio::test]
    async fn test_refused_and_timeout_are_reachability_failures() {
        let transport = Arc::new(
            FakeTransport::default().failing("refused.example", ConnectError::Refused),
        );
        let probe = probe(transport.clone());

        for raw in ["https://refused.example", "https://silent.example:1317"] {
            let candidate = Candidate::new(0, ResourceType::Rest, raw);
            let result = probe.probe(&candidate).await;
            assert_eq!(result.failure_reason(), Some(FailureReason::Reachability));
            assert_eq!(result.latency_ms, None);
        }
        assert_eq!(transport.round_trips.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_dns_failure_skips_latency() {
        let transport =
            Arc::new(FakeTransport::default().failing("nowhere.invalid", ConnectError::Dns));
        let candidate = Candidate::new(0, ResourceType::PersistentPeer, "id@nowhere.invalid:26656");

        let result = probe(transport.clone()).probe(&candidate).await;
        assert!(result.is_skipped());
        assert_eq!(transport.round_trips.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_malformed_address_never_touches_network() {
        let transport = Arc::new(FakeTransport::default());
        let candidate = Candidate::new(0, ResourceType::Seed, "1.2.3.4:26656");

        let result = probe(transport.clone()).probe(&candidate).await;
        assert_eq!(result.failure_reason(), Some(FailureReason::MalformedAddress));
        assert_eq!(result.address, None);
        assert_eq!(transport.connects.load(Ordering::SeqCst), 0);
    }
}
