//! # Cadence Core
//!
//! The Run Loop.
//! Waits for native input or the next engine wake time, drains every queued
//! native message, then hands control to the embedded engines once.

pub mod clock;
pub mod config;
pub mod engine;
pub mod error;
pub mod run_loop;
pub mod source;
pub mod state_machine;
pub mod timing;

// Re-export the main struct so users can just use `cadence_core::RunLoop`
pub use run_loop::{EngineId, Iteration, RunLoop, RunSummary};

// Re-export the seams a host has to implement
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{FailurePolicy, RunLoopConfig, TimeoutRounding};
pub use engine::Engine;
pub use error::{RunLoopError, SourceError, Stage};
pub use source::{MessageSource, NativeMessage};
pub use state_machine::LoopState;
