//! Result aggregation and ranking

use crate::probe::{ProbeResult, WsStatus};
use serde::Serialize;
use std::cmp::Ordering;

/// Ranking and truncation policy
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AggregatePolicy {
    /// Keep at most this many successes
    pub max_results: Option<usize>,
    /// Drop successes without a live websocket (RPC only)
    pub require_websocket: bool,
}

/// Partitioned, ranked results
#[derive(Debug, Clone, Default, Serialize)]
pub struct Aggregate {
    /// Successes, ascending by latency, ties in discovery order
    pub successes: Vec<ProbeResult>,
    /// Failures in discovery order, never truncated
    pub failures: Vec<ProbeResult>,
    /// Candidates dropped because their host did not resolve
    pub dns_dropped: Vec<String>,
}

/// Partition results and apply the ranking policy
///
/// Input order is taken as discovery order. The websocket filter runs before
/// the cap, so the cap counts only entries that survive the filter.
pub fn aggregate(results: Vec<ProbeResult>, policy: AggregatePolicy) -> Aggregate {
    let mut out = Aggregate::default();

    for result in results {
        if result.is_skipped() {
            out.dns_dropped.push(result.candidate.raw_address);
        } else if result.is_success() {
            out.successes.push(result);
        } else {
            out.failures.push(result);
        }
    }

    if !out.dns_dropped.is_empty() {
        tracing::warn!(
            "{} candidate(s) dropped after DNS resolution failure",
            out.dns_dropped.len()
        );
    }

    if policy.require_websocket {
        out.successes
            .retain(|r| r.ws_status == Some(WsStatus::Available));
    }

    // Vec::sort_by is stable
    out.successes.sort_by(|a, b| {
        a.latency()
            .partial_cmp(&b.latency())
            .unwrap_or(Ordering::Equal)
    });

    if let Some(max) = policy.max_results {
        out.successes.truncate(max);
    }

    out
}
