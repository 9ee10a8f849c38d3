use anyhow::Result;
use clap::Parser;

use cadence_bridge::cli::Cli;
use cadence_bridge::config::BridgeConfig;
use cadence_bridge::{app, util};

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = BridgeConfig::from_cli(&cli)?;

    util::init_tracing(&config.log_filter);
    util::install_panic_hook();

    tracing::info!("=== Cadence v{} starting ===", env!("CARGO_PKG_VERSION"));

    let summary = app::run(&config)?;

    tracing::info!(
        iterations = summary.iterations,
        dispatched = summary.messages_dispatched,
        engine_calls = summary.engine_calls,
        failures = summary.failures,
        "Run finished"
    );
    Ok(())
}
