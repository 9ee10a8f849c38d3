// cadence-bridge/src/app.rs
//! Wires a message source, the heartbeat engine, and a run loop together.

use anyhow::{Context, Result};
use cadence_core::{RunLoop, RunSummary};
use cadence_io::{MessagePoster, QueueSource, TerminalSource};
use std::io::BufRead;
use std::thread::{self, JoinHandle};

use crate::config::{BridgeConfig, SourceKind};
use crate::heartbeat::{Beat, HeartbeatEngine};
use crate::input::{InputLog, describe};

pub fn run(config: &BridgeConfig) -> Result<RunSummary> {
    tracing::info!(source = ?config.source, heartbeat_ms = config.heartbeat_ms, "Starting bridge");
    match config.source {
        SourceKind::Terminal => run_terminal(config),
        SourceKind::Stdin => run_with_reader(config, std::io::BufReader::new(std::io::stdin())),
        SourceKind::Win32 => run_win32(config),
    }
}

/// Raw mode drops the implicit carriage return, so lines end in `\r\n`.
fn emit(raw: bool, text: &str) {
    if raw {
        print!("{}\r\n", text);
    } else {
        println!("{}", text);
    }
}

fn heartbeat(config: &BridgeConfig, log: InputLog, raw: bool) -> HeartbeatEngine {
    HeartbeatEngine::new(config.heartbeat_interval())
        .with_max_beats(config.max_beats)
        .on_beat(move |beat: &Beat| {
            let stats = log.snapshot();
            emit(
                raw,
                &format!(
                    "💓 beat #{} at {} | {} input(s), last: {}",
                    beat.number,
                    beat.at.format("%H:%M:%S%.3f"),
                    stats.total(),
                    stats.last.as_deref().unwrap_or("none"),
                ),
            );
        })
}

// ════════════════════════════════════════════════════════════════════
// Terminal
// ════════════════════════════════════════════════════════════════════

fn run_terminal(config: &BridgeConfig) -> Result<RunSummary> {
    if config.max_beats.is_some() {
        tracing::warn!("Beat limit ignored for the terminal source; quit with Ctrl+C");
    }
    println!("Press Ctrl+C or Ctrl+D to quit.");

    let log = InputLog::new();
    let handler_log = log.clone();
    let source = TerminalSource::new()
        .context("Failed to put the terminal in raw mode")?
        .with_handler(move |event| {
            handler_log.record_event(event);
            emit(true, &format!("⌨️  {}", describe(event)));
        });

    // No poster to quit with, so the limit is dropped.
    let mut engine = heartbeat(config, log, true).with_max_beats(None);
    let mut run_loop = RunLoop::with_engine(source, &mut engine).with_config(config.run_loop.clone());
    Ok(run_loop.run()?)
}

// ════════════════════════════════════════════════════════════════════
// Line queue (stdin, or any reader)
// ════════════════════════════════════════════════════════════════════

/// Posts every line from `reader`, then quit once it hits EOF or an error.
pub fn spawn_line_pump<R>(reader: R, poster: MessagePoster<String>) -> JoinHandle<()>
where
    R: BufRead + Send + 'static,
{
    thread::spawn(move || {
        for line in reader.lines() {
            match line {
                Ok(line) => {
                    if poster.post(line).is_err() {
                        tracing::debug!("Loop gone, line pump exiting");
                        return;
                    }
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Input read failed");
                    break;
                }
            }
        }
        tracing::debug!("Input exhausted, posting quit");
        let _ = poster.post_quit();
    })
}

/// Runs the loop over lines read from `reader`; EOF ends the run.
pub fn run_with_reader<R>(config: &BridgeConfig, reader: R) -> Result<RunSummary>
where
    R: BufRead + Send + 'static,
{
    let (source, poster) = QueueSource::<String>::new().context("Failed to create line queue")?;

    let log = InputLog::new();
    let handler_log = log.clone();
    let source = source.with_handler(move |line: String| {
        handler_log.record_line(&line);
        emit(false, &format!("📥 {}", line));
    });

    let quit_poster = poster.clone();
    let mut engine = heartbeat(config, log, false).on_limit(move || {
        let _ = quit_poster.post_quit();
    });

    // Detached: a pump blocked on stdin must not keep us from exiting.
    let _pump = spawn_line_pump(reader, poster);

    let mut run_loop = RunLoop::with_engine(source, &mut engine).with_config(config.run_loop.clone());
    Ok(run_loop.run()?)
}

// ════════════════════════════════════════════════════════════════════
// Win32
// ════════════════════════════════════════════════════════════════════

#[cfg(windows)]
fn run_win32(config: &BridgeConfig) -> Result<RunSummary> {
    use cadence_io::Win32Source;
    use cadence_io::win32::post_quit_message;

    let mut engine = heartbeat(config, InputLog::new(), false).on_limit(|| post_quit_message(0));
    let mut run_loop = RunLoop::with_engine(Win32Source::new(), &mut engine).with_config(config.run_loop.clone());
    Ok(run_loop.run()?)
}

#[cfg(not(windows))]
fn run_win32(_config: &BridgeConfig) -> Result<RunSummary> {
    anyhow::bail!("The win32 source is only available on Windows")
}
