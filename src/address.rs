//! Address normalization
//!
//! Registries encode endpoints differently per resource type:
//!
//! - peers: `node_id@host:port`
//! - gRPC: `host:port`
//! - REST / RPC: `scheme://host[:port][/path]`
//!
//! Every form is reduced to a [`NormalizedAddress`] with a concrete port.
//! Parsing is pure and never performs I/O.

use crate::config::ResourceType;
use crate::error::AddressError;
use serde::Serialize;
use std::fmt;

/// URL scheme of an API endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Scheme {
    Http,
    Https,
}

impl Scheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scheme::Http => "http",
            Scheme::Https => "https",
        }
    }

    /// Port implied by the scheme when none is given
    pub fn default_port(&self) -> u16 {
        match self {
            Scheme::Http => 80,
            Scheme::Https => 443,
        }
    }
}

/// Canonical `(host, port, scheme)` triple
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NormalizedAddress {
    pub host: String,
    pub port: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheme: Option<Scheme>,
}

impl NormalizedAddress {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            scheme: None,
        }
    }

    pub fn with_scheme(mut self, scheme: Scheme) -> Self {
        self.scheme = Some(scheme);
        self
    }

    /// `host:port`, with IPv6 hosts bracketed
    pub fn authority(&self) -> String {
        if self.host.contains(':') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }

    /// `scheme://host:port`, defaulting to http when no scheme is known
    pub fn base_url(&self) -> String {
        let scheme = self.scheme.unwrap_or(Scheme::Http);
        format!("{}://{}", scheme.as_str(), self.authority())
    }
}

impl fmt::Display for NormalizedAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.authority())
    }
}

/// Normalize a raw registry address for the given resource type
pub fn parse(resource: ResourceType, raw: &str) -> Result<NormalizedAddress, AddressError> {
    match resource {
        ResourceType::Seed | ResourceType::PersistentPeer => parse_peer(raw),
        ResourceType::Grpc => parse_host_port(raw, raw),
        ResourceType::Rest | ResourceType::Rpc => parse_url(raw),
    }
}

/// Parse a bare `host:port` target
pub fn parse_target(raw: &str) -> Result<NormalizedAddress, AddressError> {
    parse_host_port(raw, raw)
}

/// Split `node_id@host:port` into its node id and host part
pub fn split_node_id(raw: &str) -> Option<(&str, &str)> {
    raw.split_once('@')
}

fn malformed(raw: &str, reason: &'static str) -> AddressError {
    AddressError::Malformed {
        raw: raw.to_string(),
        reason,
    }
}

/// Split an authority into host and optional port
///
/// IPv6 hosts must be bracketed (`[::1]:9090`); the brackets are dropped
/// from the returned host.
fn split_authority<'a>(
    authority: &'a str,
    raw: &str,
) -> Result<(&'a str, Option<&'a str>), AddressError> {
    let authority = authority.trim();

    let (host, port) = match authority.strip_prefix('[') {
        Some(bracketed) => {
            let (host, after) = bracketed
                .split_once(']')
                .ok_or_else(|| malformed(raw, "unclosed '['"))?;
            let port = if after.is_empty() {
                None
            } else {
                let port = after
                    .strip_prefix(':')
                    .ok_or_else(|| malformed(raw, "unexpected text after ']'"))?;
                Some(port)
            };
            (host, port)
        }
        None => {
            let (host, port) = match authority.rsplit_once(':') {
                Some((host, port)) => (host, Some(port)),
                None => (authority, None),
            };
            if host.contains(':') {
                return Err(malformed(raw, "unexpected ':' in host"));
            }
            (host, port)
        }
    };

    if host.is_empty() {
        return Err(malformed(raw, "empty host"));
    }
    if host.contains(&['[', ']'][..]) {
        return Err(malformed(raw, "unexpected bracket in host"));
    }
    Ok((host, port))
}

fn parse_peer(raw: &str) -> Result<NormalizedAddress, AddressError> {
    let (_, address) = split_node_id(raw).ok_or_else(|| malformed(raw, "missing '@'"))?;
    parse_host_port(address, raw)
}

fn parse_host_port(address: &str, raw: &str) -> Result<NormalizedAddress, AddressError> {
    let (host, port) = split_authority(address, raw)?;
    let port = port.ok_or_else(|| malformed(raw, "missing ':'"))?;
    let port = parse_port(port).ok_or_else(|| malformed(raw, "invalid port"))?;
    Ok(NormalizedAddress::new(host, port))
}

fn parse_url(raw: &str) -> Result<NormalizedAddress, AddressError> {
    let (scheme, rest) = raw
        .trim()
        .split_once("://")
        .ok_or_else(|| malformed(raw, "missing '://'"))?;
    let scheme = match scheme.to_lowercase().as_str() {
        "http" => Scheme::Http,
        "https" => Scheme::Https,
        _ => return Err(malformed(raw, "unsupported scheme")),
    };

    // Registries sometimes append a request path after the authority
    // (`host:443/rpc`); only the authority is kept. Trailing slashes go first.
    let rest = rest.trim_end_matches('/');
    let (authority, path) = rest.split_once('/').unwrap_or((rest, ""));
    let (host, port) = split_authority(authority, raw)?;

    let port = match port {
        Some(port) => parse_port(port).ok_or_else(|| malformed(raw, "invalid port"))?,
        // `host/26657`: a numeric trailing segment stands in for the port
        None => parse_port(path).unwrap_or_else(|| scheme.default_port()),
    };

    Ok(NormalizedAddress::new(host, port).with_scheme(scheme))
}

fn parse_port(port: &str) -> Option<u16> {
    let port = port.trim();
    if port.is_empty() || !port.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    port.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ok(resource: ResourceType, raw: &str) -> NormalizedAddress {
        parse(resource, raw).unwrap()
    }

    #[test]
    fn test_peer_address() {
        let addr = ok(ResourceType::Seed, "id@1.2.3.4:26656");
        assert_eq!(addr.host, "1.2.3.4");
        assert_eq!(addr.port, 26656);
        assert_eq!(addr.scheme, None);

        let addr = ok(
            ResourceType::PersistentPeer,
            "e1d7ff02b78044795371bef1f6e0fd9c5cd7b5cf@peer.example.com:26656",
        );
        assert_eq!(addr.host, "peer.example.com");
    }

    #[test]
    fn test_grpc_address() {
        let addr = ok(ResourceType::Grpc, "host.example:11290");
        assert_eq!(addr, NormalizedAddress::new("host.example", 11290));
    }

    #[test]
    fn test_rpc_with_trailing_path() {
        let addr = ok(ResourceType::Rpc, "https://host.example:443/rpc");
        assert_eq!(addr.host, "host.example");
        assert_eq!(addr.port, 443);
        assert_eq!(addr.scheme, Some(Scheme::Https));
    }

    #[test]
    fn test_rest_default_ports() {
        let addr = ok(ResourceType::Rest, "https://host.example");
        assert_eq!((addr.host.as_str(), addr.port), ("host.example", 443));

        let addr = ok(ResourceType::Rest, "http://host.example/");
        assert_eq!((addr.host.as_str(), addr.port), ("host.example", 80));

        let addr = ok(ResourceType::Rest, "https://api.example.com/lcd/");
        assert_eq!((addr.host.as_str(), addr.port), ("api.example.com", 443));
    }

    #[test]
    fn test_rpc_trailing_slashes_stripped() {
        let addr = ok(ResourceType::Rpc, "https://rpc.example.com//");
        assert_eq!(addr.host, "rpc.example.com");
        assert_eq!(addr.base_url(), "https://rpc.example.com:443");

        let addr = ok(ResourceType::Rpc, "http://rpc.example.com:26657");
        assert_eq!(addr.base_url(), "http://rpc.example.com:26657");
    }

    #[test]
    fn test_numeric_trailing_segment() {
        let addr = ok(ResourceType::Rpc, "http://rpc.example.com/26657");
        assert_eq!(addr.port, 26657);
    }

    #[test]
    fn test_missing_separators_are_malformed() {
        let cases = [
            (ResourceType::Seed, "1.2.3.4:26656"),
            (ResourceType::Seed, "id@1.2.3.4"),
            (ResourceType::PersistentPeer, ""),
            (ResourceType::Grpc, "host.example"),
            (ResourceType::Rpc, "rpc.example.com:443"),
            (ResourceType::Rest, "ftp://host.example"),
            (ResourceType::Rest, "https://"),
            (ResourceType::Grpc, "host.example:port"),
            (ResourceType::Seed, "id@host:99999"),
            (ResourceType::Rpc, "https://host.example:443:443"),
            (ResourceType::Grpc, "::1:9090"),
            (ResourceType::Grpc, "[::1:9090"),
            (ResourceType::Grpc, "[::1]9090"),
            (ResourceType::Grpc, "[]:9090"),
            (ResourceType::Rest, "https://[::1"),
        ];

        for (resource, raw) in cases {
            let result = parse(resource, raw);
            assert!(
                matches!(result, Err(AddressError::Malformed { .. })),
                "{} {:?} should be malformed, got {:?}",
                resource,
                raw,
                result
            );
        }
    }

    #[test]
    fn test_ipv6_hosts_are_unbracketed() {
        let addr = ok(ResourceType::Grpc, "[::1]:9090");
        assert_eq!(addr, NormalizedAddress::new("::1", 9090));
        assert_eq!(addr.to_string(), "[::1]:9090");

        let addr = ok(ResourceType::Seed, "id@[2001:db8::7]:26656");
        assert_eq!((addr.host.as_str(), addr.port), ("2001:db8::7", 26656));

        let addr = ok(ResourceType::Rpc, "https://[2001:db8::1]:443/rpc");
        assert_eq!(addr.host, "2001:db8::1");
        assert_eq!(addr.base_url(), "https://[2001:db8::1]:443");

        let addr = ok(ResourceType::Rest, "http://[2001:db8::1]/");
        assert_eq!(addr.port, 80);
        assert_eq!(addr.base_url(), "http://[2001:db8::1]:80");

        let addr = ok(ResourceType::Rpc, "http://[2001:db8::1]/26657");
        assert_eq!(addr.port, 26657);
    }

    #[test]
    fn test_display() {
        let addr = ok(ResourceType::Grpc, "grpc.example:9090");
        assert_eq!(addr.to_string(), "grpc.example:9090");
    }
}
