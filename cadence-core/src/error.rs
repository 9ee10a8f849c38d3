use std::fmt;
use std::io;
use thiserror::Error;

/// Failure reported by a native message source.
///
/// The cause is part of the message, not a separate `source()`.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("wait for input failed: {0}")]
    Wait(io::Error),

    #[error("message retrieval failed: {0}")]
    Retrieve(io::Error),

    #[error("message dispatch failed: {0}")]
    Dispatch(String),

    /// Nothing can ever deliver another message to this source.
    #[error("message source disconnected")]
    Disconnected,

    #[error("message source setup failed: {0}")]
    Setup(io::Error),
}

/// Which source primitive a failure came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Wait,
    Retrieve,
    Dispatch,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Wait => "wait",
            Stage::Retrieve => "retrieve",
            Stage::Dispatch => "dispatch",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum RunLoopError {
    #[error("run loop stopped during {stage}: {error}")]
    Source { stage: Stage, error: SourceError },

    #[error("run loop gave up after {count} consecutive failing iterations: {last}")]
    TooManyFailures {
        count: u32,
        last: SourceError,
    },

    #[error("run loop has already stopped")]
    AlreadyStopped,
}

pub type Result<T, E = RunLoopError> = std::result::Result<T, E>;
