use clap::Parser;
use std::path::PathBuf;

use crate::config::SourceKind;

/// Pump terminal, stdin or Win32 input into a heartbeat engine.
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "cadence", version)]
pub struct Cli {
    /// Config file (JSON). Defaults to $CADENCE_CONFIG, then the user config dir.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Where native messages come from.
    #[arg(long, value_enum)]
    pub source: Option<SourceKind>,

    /// Shorthand for `--source stdin`.
    #[arg(long)]
    pub headless: bool,

    /// Interval between heartbeats, in milliseconds.
    #[arg(long)]
    pub heartbeat_ms: Option<u64>,

    /// Quit after this many heartbeats.
    #[arg(long)]
    pub beats: Option<u64>,

    /// Log filter used when RUST_LOG is unset (e.g. "debug,cadence_core=trace").
    #[arg(long)]
    pub log: Option<String>,
}
