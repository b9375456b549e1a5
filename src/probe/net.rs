//! Network-backed transport: TCP sockets, HTTP and websockets

use super::{parse_status, ConnectError, ProtocolFailure, RpcMeta, Transport};
use crate::address::NormalizedAddress;
use crate::error::{Error, Result};
use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use serde_json::Value;
use std::net::SocketAddr;
use std::time::{Duration, Instant};
use tokio::net::{lookup_host, TcpStream};
use tokio_tungstenite::tungstenite::{self, Message};

/// Probes real endpoints
///
/// Latency is measured as the TCP handshake round trip to the candidate's
/// port. ICMP would need raw socket privileges.
pub struct NetTransport {
    /// HTTP client for RPC status requests
    http: reqwest::Client,
}

impl NetTransport {
    pub fn new() -> Result<Self> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| Error::Other(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { http })
    }

    async fn resolve(address: &NormalizedAddress) -> std::result::Result<SocketAddr, ConnectError> {
        let mut addrs = lookup_host((address.host.as_str(), address.port))
            .await
            .map_err(|e| {
                tracing::debug!("Failed to resolve {}: {}", address.host, e);
                ConnectError::Dns
            })?;
        addrs.next().ok_or(ConnectError::Dns)
    }
}

async fn ping_websocket(url: &str) -> std::result::Result<(), tungstenite::Error> {
    let (mut stream, _) = tokio_tungstenite::connect_async(url).await?;
    stream.send(Message::Ping(Vec::new())).await?;

    while let Some(message) = stream.next().await {
        if let Message::Pong(_) = message? {
            return Ok(());
        }
    }
    Err(tungstenite::Error::ConnectionClosed)
}

#[async_trait]
impl Transport for NetTransport {
    async fn connect(
        &self,
        address: &NormalizedAddress,
        timeout: Duration,
    ) -> std::result::Result<Duration, ConnectError> {
        // Resolution and handshake share one budget
        let deadline = tokio::time::Instant::now() + timeout;
        let addr = match tokio::time::timeout_at(deadline, Self::resolve(address)).await {
            Ok(resolved) => resolved?,
            Err(_) => return Err(ConnectError::Timeout),
        };

        let start = Instant::now();
        match tokio::time::timeout_at(deadline, TcpStream::connect(addr)).await {
            Ok(Ok(_stream)) => Ok(start.elapsed()),
            Ok(Err(e)) => {
                tracing::debug!("Connection to {} failed: {}", addr, e);
                Err(ConnectError::Refused)
            }
            Err(_) => Err(ConnectError::Timeout),
        }
    }

    async fn round_trip(&self, address: &NormalizedAddress, timeout: Duration) -> Option<Duration> {
        self.connect(address, timeout).await.ok()
    }

    async fn rpc_status(
        &self,
        url: &str,
        timeout: Duration,
    ) -> std::result::Result<RpcMeta, ProtocolFailure> {
        let response = self
            .http
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| {
                tracing::debug!("Request to {} failed: {}", url, e);
                ProtocolFailure { status_code: None }
            })?;

        let status_code = response.status().as_u16();
        let failure = ProtocolFailure {
            status_code: Some(status_code),
        };
        if status_code != 200 {
            return Err(failure);
        }

        let body: Value = response.json().await.map_err(|e| {
            tracing::debug!("Undecodable status from {}: {}", url, e);
            failure
        })?;
        parse_status(&body).ok_or(failure)
    }

    async fn websocket_ping(&self, url: &str, timeout: Duration) -> bool {
        match tokio::time::timeout(timeout, ping_websocket(url)).await {
            Ok(Ok(())) => true,
            Ok(Err(e)) => {
                tracing::debug!("Websocket {} failed: {}", url, e);
                false
            }
            Err(_) => false,
        }
    }
}
