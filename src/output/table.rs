//! Plain-text table writer

use super::OutputWriter;
use crate::config::ResourceType;
use crate::error::Result;
use crate::pipeline::{Report, RunStatus};
use crate::probe::{ProbeResult, WsStatus};
use std::io::Write;

/// Writes success and failure tables followed by a run summary
pub struct TableWriter {
    out: Box<dyn Write + Send>,
}

impl TableWriter {
    pub fn new(out: Box<dyn Write + Send>) -> Self {
        Self { out }
    }
}

/// Render rows under a header with `+---+` borders
fn render_table(header: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = header.iter().map(|h| h.len()).collect();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let border: String = widths
        .iter()
        .map(|w| format!("+{}", "-".repeat(w + 2)))
        .collect::<String>()
        + "+\n";
    let line = |cells: Vec<&str>| -> String {
        let mut s: String = cells
            .iter()
            .zip(&widths)
            .map(|(cell, w)| format!("| {:<width$} ", cell, width = w))
            .collect();
        s.push_str("|\n");
        s
    };

    let mut table = border.clone();
    table.push_str(&line(header.to_vec()));
    table.push_str(&border);
    for row in rows {
        table.push_str(&line(row.iter().map(String::as_str).collect()));
    }
    if !rows.is_empty() {
        table.push_str(&border);
    }
    table
}

fn success_table(resource: ResourceType, results: &[ProbeResult]) -> String {
    match resource {
        ResourceType::Seed | ResourceType::PersistentPeer => {
            let rows: Vec<Vec<String>> = results
                .iter()
                .map(|r| {
                    vec![
                        r.candidate.node_id.clone().unwrap_or_default(),
                        r.display_address(),
                        r.latency().to_string(),
                    ]
                })
                .collect();
            render_table(&["NODE-ID", "ADDRESS:PORT", "PING TIME (ms)"], &rows)
        }
        ResourceType::Rest | ResourceType::Grpc => {
            let rows: Vec<Vec<String>> = results
                .iter()
                .map(|r| vec![r.display_address(), r.latency().to_string()])
                .collect();
            render_table(&["ADDRESS:PORT", "PING TIME (ms)"], &rows)
        }
        ResourceType::Rpc => {
            let rows: Vec<Vec<String>> = results
                .iter()
                .map(|r| {
                    let (tx_index, catching_up, voting_power) = match &r.rpc_meta {
                        Some(meta) => (
                            meta.tx_indexing.to_string(),
                            meta.catching_up.to_string(),
                            meta.voting_power.clone(),
                        ),
                        None => Default::default(),
                    };
                    let websocket = match r.ws_status {
                        Some(WsStatus::Available) => "yes",
                        _ => "no",
                    };
                    vec![
                        r.display_address(),
                        r.latency().to_string(),
                        tx_index,
                        catching_up,
                        voting_power,
                        websocket.to_string(),
                    ]
                })
                .collect();
            render_table(
                &[
                    "ADDRESS:PORT",
                    "PING TIME (ms)",
                    "TX INDEXING",
                    "CATCHING UP",
                    "VOTING POWER",
                    "WEBSOCKET",
                ],
                &rows,
            )
        }
    }
}

fn failure_table(resource: ResourceType, results: &[ProbeResult]) -> String {
    let reason = |r: &ProbeResult| {
        r.failure_reason()
            .map(|reason| reason.to_string())
            .unwrap_or_default()
    };

    if resource.is_peer() {
        let rows: Vec<Vec<String>> = results
            .iter()
            .map(|r| {
                vec![
                    r.candidate.node_id.clone().unwrap_or_default(),
                    r.display_address(),
                    reason(r),
                ]
            })
            .collect();
        render_table(&["NODE-ID", "ADDRESS:PORT", "REASON"], &rows)
    } else {
        let rows: Vec<Vec<String>> = results
            .iter()
            .map(|r| vec![r.display_address(), reason(r)])
            .collect();
        render_table(&["ADDRESS:PORT", "REASON"], &rows)
    }
}

fn describe_method(resource: ResourceType) -> &'static str {
    match resource {
        ResourceType::Seed | ResourceType::PersistentPeer => {
            "SEEDS and PERSISTENT PEERS are tested via TCP connect then latency"
        }
        ResourceType::Rest | ResourceType::Grpc => {
            "GRPC and REST servers are tested via TCP connect then latency"
        }
        ResourceType::Rpc => "RPC servers are tested via /status, latency and websocket ping",
    }
}

/// Full text rendering of a report
pub fn render_report(report: &Report) -> String {
    let mut text = format!("========== {}\n\n", describe_method(report.resource));

    text.push_str("Success =======================================================\n");
    text.push_str(" Ping time 0 means the server did not answer the latency probe.\n");
    text.push_str(&success_table(report.resource, &report.successes));

    text.push_str("\nFailed ========================================================\n");
    if report.resource == ResourceType::Rpc {
        text.push_str(" 'Error 200' means the server replied, but not as expected.\n");
    }
    text.push_str(&failure_table(report.resource, &report.failures));

    if !report.dns_dropped.is_empty() {
        text.push_str(&format!(
            "\nDropped (DNS resolution failed): {}\n",
            report.dns_dropped.join(", ")
        ));
    }

    text.push_str(&format!(
        "\n{} of {} candidates tested in {:.2}s: {} ok, {} failed, {} dropped{}\n",
        report.probed,
        report.candidates,
        report.elapsed_secs,
        report.successes.len(),
        report.failures.len(),
        report.dns_dropped.len(),
        match report.status {
            RunStatus::Completed => "",
            RunStatus::Aborted => " (aborted, results are partial)",
        }
    ));
    text
}

impl OutputWriter for TableWriter {
    fn write_report(&mut self, report: &Report) -> Result<()> {
        self.out.write_all(render_report(report).as_bytes())?;
        Ok(())
    }

    fn finalize(&mut self) -> Result<()> {
        self.out.flush()?;
        Ok(())
    }
}
