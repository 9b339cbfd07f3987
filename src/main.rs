use anyhow::{Context, Result};
use ccx_cluster_filter::{
    filter_cluster_list, parse_cluster_entries, read_cluster_list, write_clusters,
    DigestAlgorithm, ProcessingConfiguration,
};
use clap::Parser;
use std::fs::File;
use std::io::{self, IsTerminal, Read};
use std::path::PathBuf;
use std::process::exit;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Filter a JSON list of cluster entries through allow and block lists
#[derive(Debug, Parser)]
#[command(about, version)]
struct Cli {
    /// Path to the cluster list (JSON array), or - for stdin
    #[arg(value_name = "clusters-file")]
    input: String,

    /// Optional output file (defaults to stdout)
    #[arg(value_name = "output-file")]
    output: Option<PathBuf>,

    /// Service configuration file holding the [processing] table
    #[arg(short, long, value_name = "file", env = "CCX_FILTER_CONFIG")]
    config: Option<PathBuf>,

    /// Keep only clusters listed in this file (one name per line)
    #[arg(long, value_name = "file")]
    allow: Option<PathBuf>,

    /// Drop clusters listed in this file (one name per line)
    #[arg(long, value_name = "file")]
    block: Option<PathBuf>,

    /// Compute checksum of filtered output (sha256, sha512)
    #[arg(long, value_name = "algorithm")]
    digest: Option<DigestAlgorithm>,
}

fn main() {
    let layer = fmt::layer()
        .compact()
        .with_ansi(io::stderr().is_terminal())
        .with_writer(io::stderr);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry().with(layer).with(filter).init();

    if let Err(error) = run(Cli::parse()) {
        error!("{error:?}");
        exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = load_configuration(&cli)?;

    let input: Box<dyn Read> = if cli.input == "-" {
        Box::new(io::stdin())
    } else {
        Box::new(File::open(&cli.input).with_context(|| format!("failed to open {}", cli.input))?)
    };
    let clusters = parse_cluster_entries(input)
        .with_context(|| format!("failed to read clusters from {}", cli.input))?;

    let (filtered, removed) = filter_cluster_list(&clusters, &config);
    info!(
        total = clusters.len(),
        kept = filtered.len(),
        removed,
        "filtered cluster list"
    );

    let checksum = match &cli.output {
        Some(path) => {
            let mut output = File::create(path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            let checksum = write_clusters(&filtered, &mut output, cli.digest)?;
            info!(path = %path.display(), "written filtered clusters");
            checksum
        }
        None => write_clusters(&filtered, &mut io::stdout().lock(), cli.digest)?,
    };

    if let Some(checksum) = checksum {
        info!(bytes = checksum.bytes, "{checksum}");
    }

    Ok(())
}

/// Base configuration from file, extended by --allow and --block lists
fn load_configuration(cli: &Cli) -> Result<ProcessingConfiguration> {
    let mut config = match &cli.config {
        Some(path) => ProcessingConfiguration::load(path)?,
        None => ProcessingConfiguration::default(),
    };

    if let Some(path) = &cli.allow {
        let allowed = read_cluster_list(path)?;
        info!(count = allowed.len(), "loaded clusters from allowlist");
        config.allow(allowed);
    }
    if let Some(path) = &cli.block {
        let blocked = read_cluster_list(path)?;
        info!(count = blocked.len(), "loaded clusters from blocklist");
        config.block(blocked);
    }

    Ok(config)
}
