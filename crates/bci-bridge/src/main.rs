//! BCI Bridge - EEG acquisition to OSC
//!
//! Signal flow: board session -> filter -> resample -> spectrum -> OSC/UDP

mod cli;
mod devices;
mod host;
mod osc_sink;

use anyhow::Result;
use bci_processing::BridgeContext;
use clap::Parser;
use cli::Cli;
use devices::DeviceRegistry;
use osc_sink::OscConnector;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    let config = cli.load_config()?;
    if cli.print_config {
        println!("{}", config.to_json()?);
        return Ok(());
    }

    let registry = DeviceRegistry::new(cli.synthetic_config()?);
    let mut context = BridgeContext::new(Box::new(registry), Box::new(OscConnector));

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    let summary = host::run(&mut context, &config, cli.cycles, shutdown).await;

    info!("Stopping bridge");
    context.shutdown()?;
    info!(
        completed = summary.completed,
        skipped = summary.skipped,
        failed = summary.failed,
        overruns = summary.overruns,
        messages = summary.messages_sent,
        "Bridge stopped"
    );

    Ok(())
}

fn init_tracing(default_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
