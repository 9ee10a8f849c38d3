// cadence-core/src/run_loop.rs
//! The wait → drain → process cycle.
//!
//! One iteration:
//!   1. wait for input, or until the earliest engine wake time
//!   2. drain every queued native message (quit stops the drain)
//!   3. clamp the wake time down to "now" if anything was drained
//!   4. call every registered engine exactly once, keep the earliest wake time
//!
//! Everything runs on the calling thread. The source's wait call is the only
//! place the loop blocks.

use std::fmt;
use std::time::{Duration, Instant};

use crate::clock::{Clock, SystemClock};
use crate::config::{FailurePolicy, RunLoopConfig};
use crate::engine::Engine;
use crate::error::{Result, RunLoopError, SourceError, Stage};
use crate::source::{MessageSource, NativeMessage};
use crate::state_machine::{LoopState, TransitionEvent, next_state};
use crate::timing::{quantize, wait_duration};

// ════════════════════════════════════════════════════════════════════
// Reports
// ════════════════════════════════════════════════════════════════════

/// Handle returned by `RunLoop::add_engine`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EngineId(u64);

/// What a single call to `RunLoop::step` did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Iteration {
    /// Timeout handed to the source, after quantization. `None` = forever.
    pub wait: Option<Duration>,
    /// Messages removed from the queue, including a quit message.
    pub drained: usize,
    pub dispatched: usize,
    pub quit: bool,
    /// Wake time after the post-drain clamp, before the engines ran.
    pub wake_after_drain: Option<Instant>,
    /// Earliest wake time reported by the engines this iteration.
    pub next_wake: Option<Instant>,
    /// Source failures tolerated during this iteration.
    pub failures: u32,
    pub state: LoopState,
}

/// Totals accumulated over the loop's lifetime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub iterations: u64,
    pub messages_dispatched: u64,
    pub engine_calls: u64,
    pub failures: u64,
}

// ════════════════════════════════════════════════════════════════════
// RunLoop
// ════════════════════════════════════════════════════════════════════

/// Pumps a native message source and the engines it was given.
///
/// Engines are borrowed, never owned: whoever created them must keep them
/// alive for as long as the loop exists.
pub struct RunLoop<'e, S, C = SystemClock> {
    source: S,
    clock: C,
    config: RunLoopConfig,
    engines: Vec<(EngineId, &'e mut dyn Engine)>,
    next_engine_id: u64,
    next_wake: Option<Instant>,
    state: LoopState,
    summary: RunSummary,
    consecutive_failures: u32,
}

impl<'e, S: MessageSource> RunLoop<'e, S, SystemClock> {
    pub fn new(source: S) -> Self {
        Self::with_parts(source, SystemClock, RunLoopConfig::default())
    }

    /// The common case: one source, one engine.
    pub fn with_engine(source: S, engine: &'e mut dyn Engine) -> Self {
        let mut run_loop = Self::new(source);
        run_loop.add_engine(engine);
        run_loop
    }
}

impl<'e, S: MessageSource, C: Clock> RunLoop<'e, S, C> {
    pub fn with_parts(source: S, clock: C, config: RunLoopConfig) -> Self {
        Self {
            source,
            clock,
            config,
            engines: Vec::new(),
            next_engine_id: 0,
            next_wake: None,
            state: LoopState::Running,
            summary: RunSummary::default(),
            consecutive_failures: 0,
        }
    }

    pub fn with_config(mut self, config: RunLoopConfig) -> Self {
        self.config = config;
        self
    }

    /// Registers an engine. It is processed on the very next iteration.
    pub fn add_engine(&mut self, engine: &'e mut dyn Engine) -> EngineId {
        let id = EngineId(self.next_engine_id);
        self.next_engine_id += 1;
        self.engines.push((id, engine));

        // A new engine hasn't reported a wake time yet, so don't sleep on it.
        let now = self.clock.now();
        self.next_wake = Some(self.next_wake.map_or(now, |wake| wake.min(now)));

        tracing::debug!(?id, engines = self.engines.len(), "Engine registered");
        id
    }

    /// Unregisters an engine. Returns false if the id is unknown.
    pub fn remove_engine(&mut self, id: EngineId) -> bool {
        let before = self.engines.len();
        self.engines.retain(|(engine_id, _)| *engine_id != id);
        let removed = self.engines.len() != before;
        if removed {
            tracing::debug!(?id, engines = self.engines.len(), "Engine removed");
        }
        removed
    }

    pub fn engine_count(&self) -> usize {
        self.engines.len()
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn next_wake_time(&self) -> Option<Instant> {
        self.next_wake
    }

    pub fn summary(&self) -> RunSummary {
        self.summary
    }

    pub fn config(&self) -> &RunLoopConfig {
        &self.config
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    pub fn into_source(self) -> S {
        self.source
    }

    /// Runs iterations until the source delivers a quit message.
    pub fn run(&mut self) -> Result<RunSummary> {
        if !self.state.is_running() {
            return Err(RunLoopError::AlreadyStopped);
        }

        tracing::info!(engines = self.engines.len(), "▶️ Run loop started");

        while self.state.is_running() {
            if let Err(e) = self.step() {
                tracing::error!("Run loop failed: {}", e);
                return Err(e);
            }
        }

        let summary = self.summary;
        tracing::info!(
            iterations = summary.iterations,
            dispatched = summary.messages_dispatched,
            engine_calls = summary.engine_calls,
            failures = summary.failures,
            "⏹️ Run loop stopped"
        );
        Ok(summary)
    }

    /// Runs exactly one iteration.
    pub fn step(&mut self) -> Result<Iteration> {
        if !self.state.is_running() {
            return Err(RunLoopError::AlreadyStopped);
        }

        let mut failures = 0u32;
        let mut last_error = None;

        // ── 1. Wait ──────────────────────────────────────────────
        let wait = wait_duration(self.next_wake, self.clock.now()).map(|remaining| {
            quantize(
                remaining,
                self.config.timer_granularity,
                self.config.timeout_rounding,
            )
        });
        tracing::trace!(?wait, "Waiting for input");

        if let Err(e) = self.source.wait(wait) {
            self.tolerate(Stage::Wait, e, &mut failures, &mut last_error)?;
        }

        // ── 2. Drain ─────────────────────────────────────────────
        let mut drained = 0usize;
        let mut dispatched = 0usize;
        let mut quit = false;

        loop {
            let message = match self.source.try_next() {
                Ok(Some(message)) => message,
                Ok(None) => break,
                Err(e) => {
                    self.tolerate(Stage::Retrieve, e, &mut failures, &mut last_error)?;
                    break;
                }
            };
            drained += 1;

            if message.is_quit() {
                tracing::debug!(drained, "Quit message received");
                quit = true;
                break;
            }

            match self.source.dispatch(message) {
                Ok(()) => dispatched += 1,
                Err(e) => self.tolerate(Stage::Dispatch, e, &mut failures, &mut last_error)?,
            }
        }

        // ── 3. Clamp ─────────────────────────────────────────────
        if drained > 0 {
            let now = self.clock.now();
            self.next_wake = Some(self.next_wake.map_or(now, |wake| wake.min(now)));
        }
        let wake_after_drain = self.next_wake;

        // ── 4. Process ───────────────────────────────────────────
        let mut next_wake: Option<Instant> = None;
        for (_, engine) in &mut self.engines {
            let wake = engine.process_messages();
            self.summary.engine_calls += 1;
            next_wake = Some(next_wake.map_or(wake, |earliest| earliest.min(wake)));
        }
        self.next_wake = next_wake;

        self.summary.iterations += 1;
        self.summary.messages_dispatched += dispatched as u64;
        self.summary.failures += u64::from(failures);

        tracing::trace!(drained, dispatched, ?next_wake, "Iteration complete");

        let event = if quit {
            TransitionEvent::QuitReceived
        } else {
            TransitionEvent::IterationCompleted
        };
        self.state = next_state(self.state, event);

        // ── Failure budget ───────────────────────────────────────
        match last_error {
            Some(last) => {
                self.consecutive_failures += 1;
                // A quit drained in the same iteration still ends the loop cleanly.
                if !quit && self.consecutive_failures >= self.config.max_consecutive_failures {
                    self.state = next_state(self.state, TransitionEvent::FatalFailure);
                    return Err(RunLoopError::TooManyFailures {
                        count: self.consecutive_failures,
                        last,
                    });
                }
            }
            None => self.consecutive_failures = 0,
        }

        Ok(Iteration {
            wait,
            drained,
            dispatched,
            quit,
            wake_after_drain,
            next_wake,
            failures,
            state: self.state,
        })
    }

    /// Applies the failure policy. `Err` means the loop has stopped.
    fn tolerate(
        &mut self,
        stage: Stage,
        error: SourceError,
        failures: &mut u32,
        last_error: &mut Option<SourceError>,
    ) -> Result<()> {
        match self.config.failure_policy {
            FailurePolicy::Fatal => {
                self.state = next_state(self.state, TransitionEvent::FatalFailure);
                Err(RunLoopError::Source { stage, error })
            }
            FailurePolicy::LogAndContinue => {
                tracing::warn!(%stage, "⚠️ Message source failure: {}", error);
                *failures += 1;
                *last_error = Some(error);
                Ok(())
            }
        }
    }
}

impl<S, C> fmt::Debug for RunLoop<'_, S, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunLoop")
            .field("state", &self.state)
            .field("engines", &self.engines.len())
            .field("next_wake", &self.next_wake)
            .field("summary", &self.summary)
            .field("config", &self.config)
            .finish()
    }
}
