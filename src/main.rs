use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context as _, Result};
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use doddns::config::Config;
use doddns::constants::{EXIT_FATAL, EXIT_SUCCESS};
use doddns::digitalocean::DigitalOceanClient;
use doddns::ip_discovery::IpDiscovery;
use doddns::metrics;
use doddns::reconciler::{self, exit_status};

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

//==============================================================================
// Main
//==============================================================================

#[derive(Debug, Parser)]
#[command(name = "doddns")]
#[command(version = VERSION)]
#[command(about = "Point DigitalOcean DNS records at this machine's public IP addresses")]
struct Args {
    /// Config file (default: config.json next to the executable)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log planned changes without applying them
    #[arg(short = 'n', long)]
    dry_run: bool,

    /// Write Prometheus metrics to this file when the run ends
    #[arg(long)]
    metrics_file: Option<PathBuf>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = Args::parse();

    let config = match Config::load(args.config.clone()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Config load failed: {:#}", e);
            return ExitCode::from(EXIT_FATAL);
        }
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if config.verbose { "debug" } else { "info" }));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match run(&args, &config).await {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            error!("{:#}", e);
            ExitCode::from(EXIT_FATAL)
        }
    }
}

async fn run(args: &Args, config: &Config) -> Result<u8> {
    info!("doddns {} starting ({} domains)", VERSION, config.domains.len());

    let discovery = IpDiscovery::new(&config.ipv4_url, &config.ipv6_url, config.timeout)
        .context("IP discovery client failed")?;
    let client = DigitalOceanClient::new(&config.api_base, config.timeout)
        .context("DigitalOcean client failed")?;

    let outcomes = reconciler::run(config, &discovery, &client, args.dry_run).await?;
    let code = exit_status(&outcomes);

    if let Some(path) = &args.metrics_file {
        metrics::set_last_run(code == EXIT_SUCCESS);
        if let Err(e) = metrics::write_textfile(path) {
            error!("Metrics export failed: {:#}", e);
        }
    }

    Ok(code)
}
