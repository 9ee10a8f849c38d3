// cadence-bridge/src/config.rs

use anyhow::{Context, Result};
use cadence_core::RunLoopConfig;
use clap::ValueEnum;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::cli::Cli;

/// Environment variable that points at a config file.
pub const CONFIG_ENV: &str = "CADENCE_CONFIG";

// ════════════════════════════════════════════════════════════════════
// Data types
// ════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// Raw-mode terminal events (keys, mouse, resize).
    #[default]
    Terminal,
    /// One message per stdin line; EOF quits.
    Stdin,
    /// The thread's Win32 message queue (Windows only).
    Win32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    pub source: SourceKind,
    pub heartbeat_ms: u64,
    pub max_beats: Option<u64>,
    pub log_filter: String,
    pub run_loop: RunLoopConfig,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            source: SourceKind::Terminal,
            heartbeat_ms: 1000,
            max_beats: None,
            log_filter: "info".to_string(),
            run_loop: RunLoopConfig::default(),
        }
    }
}

// ════════════════════════════════════════════════════════════════════
// Loading
// ════════════════════════════════════════════════════════════════════

/// `<config dir>/cadence.json`, per platform conventions.
pub fn default_config_path() -> Option<PathBuf> {
    ProjectDirs::from("com", "DrTomLLC", "cadence").map(|dirs| dirs.config_dir().join("cadence.json"))
}

impl BridgeConfig {
    /// Reads a config file that must exist.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse config {}", path.display()))
    }

    /// Like `load`, but a missing file just means defaults.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }
        Self::load(path)
    }

    /// Resolves the config the way the binary does: `--config` (must exist),
    /// then `$CADENCE_CONFIG`, then the default path; CLI flags override.
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let mut config = match &cli.config {
            Some(path) => Self::load(path)?,
            None => match std::env::var_os(CONFIG_ENV)
                .map(PathBuf::from)
                .or_else(default_config_path)
            {
                Some(path) => Self::load_or_default(&path)?,
                None => Self::default(),
            },
        };
        config.apply_cli(cli);
        Ok(config)
    }

    pub fn apply_cli(&mut self, cli: &Cli) {
        if let Some(source) = cli.source {
            self.source = source;
        }
        if cli.headless {
            self.source = SourceKind::Stdin;
        }
        if let Some(ms) = cli.heartbeat_ms {
            self.heartbeat_ms = ms;
        }
        if let Some(beats) = cli.beats {
            self.max_beats = Some(beats);
        }
        if let Some(filter) = &cli.log {
            self.log_filter = filter.clone();
        }
    }

    /// Clamped to at least one millisecond.
    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_millis(self.heartbeat_ms.max(1))
    }
}
