//! Run driver
//!
//! `validate -> preflight -> fetch candidates -> probe (bounded parallel) ->
//! aggregate`. Results are buffered until every probe has finished and
//! ordered by discovery index before ranking, so output never depends on
//! completion order.

use crate::address;
use crate::aggregate::{aggregate, AggregatePolicy};
use crate::config::{ResourceType, RunConfig};
use crate::error::{Error, Result};
use crate::probe::{self, NetTransport, ProbeResult, Transport};
use crate::source::{Candidate, CandidateSource, HttpSource};
use futures::future;
use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Progress callback type
pub type ProgressCallback = Box<dyn Fn(ProbeProgress) + Send + Sync>;

/// Reported after each candidate completes
#[derive(Debug, Clone)]
pub struct ProbeProgress {
    /// Candidates finished so far
    pub completed: usize,
    /// Candidates in the run
    pub total: usize,
    /// Address of the candidate that just finished
    pub address: String,
}

/// How the run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// Every candidate was probed
    Completed,
    /// Cancelled or past the deadline; results are partial
    Aborted,
}

/// Everything a presenter needs from one run
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub chain: String,
    pub resource: ResourceType,
    pub status: RunStatus,
    /// Candidates returned by the source
    pub candidates: usize,
    /// Candidates actually probed
    pub probed: usize,
    pub successes: Vec<ProbeResult>,
    pub failures: Vec<ProbeResult>,
    /// Raw addresses dropped after DNS resolution failure
    pub dns_dropped: Vec<String>,
    pub elapsed_secs: f64,
}

impl Report {
    /// Comma-joined `node_id@host:port` of the successes, peers only
    pub fn peer_string(&self) -> Option<String> {
        if !self.resource.is_peer() {
            return None;
        }
        let peers: Vec<String> = self
            .successes
            .iter()
            .filter_map(ProbeResult::peer_string)
            .collect();
        Some(peers.join(","))
    }
}

/// Probes every candidate of one chain and resource type
pub struct Pipeline {
    config: RunConfig,
    source: Arc<dyn CandidateSource>,
    transport: Arc<dyn Transport>,
    progress_callback: Option<ProgressCallback>,
    cancel: Arc<AtomicBool>,
}

impl Pipeline {
    /// Create a pipeline talking to the real network
    pub fn new(config: RunConfig) -> Result<Self> {
        let source = Arc::new(HttpSource::new(config.sources.clone())?);
        let transport = Arc::new(NetTransport::new()?);
        Ok(Self::with_parts(config, source, transport))
    }

    /// Create a pipeline from explicit collaborators
    pub fn with_parts(
        config: RunConfig,
        source: Arc<dyn CandidateSource>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        Self {
            config,
            source,
            transport,
            progress_callback: None,
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Set progress callback
    pub fn with_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(ProbeProgress) + Send + Sync + 'static,
    {
        self.progress_callback = Some(Box::new(callback));
        self
    }

    /// Flag that stops new probes from being issued once set
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        self.cancel.clone()
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Check outbound connectivity once before the run
    pub async fn preflight(&self) -> Result<()> {
        let Some(target) = &self.config.preflight_target else {
            return Ok(());
        };
        let address = address::parse_target(target).map_err(|e| Error::Preflight(e.to_string()))?;

        self.transport
            .connect(&address, self.config.timeouts.preflight)
            .await
            .map(|_| ())
            .map_err(|e| Error::Preflight(format!("no connection to {}: {:?}", address, e)))
    }

    /// Run the whole pipeline
    pub async fn run(&self) -> Result<Report> {
        let start = Instant::now();

        self.preflight().await?;

        let candidates = self
            .source
            .fetch(
                &self.config.chain,
                self.config.resource,
                self.config.alternate_source,
            )
            .await?;
        let total = candidates.len();
        tracing::info!(
            "Testing {} {} candidates for {}",
            total,
            self.config.resource,
            self.config.chain
        );

        let results = self.probe_all(candidates, start).await;
        let probed = results.len();
        let status = if probed < total {
            tracing::warn!("Run aborted after {} of {} candidates", probed, total);
            RunStatus::Aborted
        } else {
            RunStatus::Completed
        };

        let aggregated = aggregate(
            results,
            AggregatePolicy {
                max_results: self.config.max_results,
                require_websocket: self.config.require_websocket,
            },
        );

        Ok(Report {
            chain: self.config.chain.clone(),
            resource: self.config.resource,
            status,
            candidates: total,
            probed,
            successes: aggregated.successes,
            failures: aggregated.failures,
            dns_dropped: aggregated.dns_dropped,
            elapsed_secs: start.elapsed().as_secs_f64(),
        })
    }

    /// Probe candidates with bounded concurrency, returning results in
    /// discovery order. Stops issuing probes once cancelled or past the
    /// deadline; in-flight probes still finish.
    async fn probe_all(&self, candidates: Vec<Candidate>, start: Instant) -> Vec<ProbeResult> {
        let total = candidates.len();
        let probe = probe::for_resource(
            self.config.resource,
            self.transport.clone(),
            self.config.timeouts,
        );
        let completed = Arc::new(AtomicUsize::new(0));
        let deadline = self.config.deadline;
        let cancel = self.cancel.clone();

        let mut results: Vec<ProbeResult> = stream::iter(candidates)
            .take_while(move |_| {
                let expired = deadline.is_some_and(|d| start.elapsed() >= d);
                future::ready(!expired && !cancel.load(Ordering::SeqCst))
            })
            .map(|candidate| {
                let probe = probe.clone();
                let completed = completed.clone();
                let callback = &self.progress_callback;

                async move {
                    let result = probe.probe(&candidate).await;
                    let done = completed.fetch_add(1, Ordering::SeqCst) + 1;

                    if let Some(cb) = callback {
                        cb(ProbeProgress {
                            completed: done,
                            total,
                            address: candidate.raw_address.clone(),
                        });
                    }
                    result
                }
            })
            .buffer_unordered(self.config.concurrency)
            .collect()
            .await;

        results.sort_by_key(|r| r.candidate.index);
        results
    }
}
