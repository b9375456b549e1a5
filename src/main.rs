//! chain-registry-query CLI - probe chain registry peers and API endpoints

use chain_registry_query::{
    create_writer, write_peer_file, ConfigFile, OutputFormat, Pipeline, ProbeProgress,
    ResourceType, RunConfig,
};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::sync::atomic::Ordering;
use std::time::Duration;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "chain-registry-query")]
#[command(
    version,
    about = "Find reachable peers and API endpoints advertised in the chain registry"
)]
#[command(after_help = r#"EXAMPLES:
    # Rank the seeds of a chain and write a ready-to-paste list
    chain-registry-query osmosis seeds

    # Five fastest RPC servers that also serve websockets
    chain-registry-query cosmoshub rpc --max-results 5 --require-websocket

    # Persistent peers from the live peer discovery API
    chain-registry-query juno persistent_peers --polkachu

    # Machine-readable report
    chain-registry-query akash grpc --format json -o grpc.json

CONFIG FILE:
    Default: ~/.config/chain-registry-query/config.toml
"#)]
struct Cli {
    /// Chain name as used in the chain registry (e.g. osmosis)
    chain: String,

    /// Resource type: seeds, persistent_peers, rpc, rest or grpc
    #[arg(value_name = "TYPE")]
    resource: String,

    /// Maximum number of results to display (all candidates are still tested)
    #[arg(long, alias = "max_results")]
    max_results: Option<usize>,

    /// Use the live peer discovery API instead of the registry (persistent_peers only)
    #[arg(long)]
    polkachu: bool,

    /// Do not write the ready-to-paste peer file
    #[arg(long, alias = "no_fileout")]
    no_fileout: bool,

    /// Only keep RPC servers with a working websocket
    #[arg(long)]
    require_websocket: bool,

    /// Number of candidates probed at once
    #[arg(short = 'n', long)]
    concurrency: Option<usize>,

    /// Stop issuing probes after this many seconds and report partial results
    #[arg(long)]
    deadline: Option<u64>,

    /// Output format (table or json)
    #[arg(long, default_value = "table")]
    format: String,

    /// Report file path (stdout if not specified)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Directory for the ready-to-paste peer file
    #[arg(long, default_value = ".")]
    output_dir: PathBuf,

    /// Config file path
    #[arg(long)]
    config: Option<PathBuf>,

    /// Skip the outbound connectivity check
    #[arg(long)]
    no_preflight: bool,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress progress output
    #[arg(short, long)]
    quiet: bool,
}

fn build_config(cli: &Cli) -> anyhow::Result<RunConfig> {
    let resource: ResourceType = cli.resource.parse()?;

    let config_file = match &cli.config {
        Some(path) => Some(ConfigFile::load(path)?),
        None => ConfigFile::load_default().unwrap_or_else(|e| {
            tracing::warn!("Ignoring config file: {}", e);
            None
        }),
    };

    let mut builder = RunConfig::builder();
    if let Some(file) = &config_file {
        builder = builder.apply_file(file);
    }

    builder = builder
        .chain(&cli.chain)
        .resource(resource)
        .alternate_source(cli.polkachu)
        .max_results(cli.max_results)
        .require_websocket(cli.require_websocket)
        .deadline(cli.deadline.map(Duration::from_secs));

    if let Some(concurrency) = cli.concurrency {
        builder = builder.concurrency(concurrency);
    }
    if cli.no_preflight {
        builder = builder.preflight_target(None);
    }

    Ok(builder.build()?)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Set up logging
    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(EnvFilter::new(filter))
        .init();

    // Rejects invalid combinations before any network activity
    let config = build_config(&cli)?;
    let format: OutputFormat = cli.format.parse()?;

    // Set up progress bar
    let pb = if !cli.quiet {
        let pb = ProgressBar::new(0);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
                .progress_chars("#>-"),
        );
        Some(pb)
    } else {
        None
    };

    let pb_clone = pb.clone();
    let pipeline = Pipeline::new(config)?.with_progress(move |progress: ProbeProgress| {
        if let Some(ref pb) = pb_clone {
            pb.set_length(progress.total as u64);
            pb.set_position(progress.completed as u64);
            pb.set_message(format!("Tested {}", progress.address));
        }
    });

    let cancel = pipeline.cancel_flag();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            cancel.store(true, Ordering::SeqCst);
        }
    });

    let report = pipeline.run().await;

    if let Some(ref pb) = pb {
        pb.finish_and_clear();
    }
    let report = report?;

    // Write output
    let mut writer = create_writer(format, cli.output.as_deref())?;
    writer.write_report(&report)?;
    writer.finalize()?;

    if !cli.no_fileout {
        if let Some(path) = write_peer_file(&report, &cli.output_dir)? {
            if !cli.quiet {
                eprintln!("Writing out ready-to-paste results to {}", path.display());
            }
        }
    }

    Ok(())
}
