//! # Cadence IO
//!
//! The Native Message Sources.
//! Each backend wraps one platform's "wait for input or timeout" primitive
//! behind `cadence_core::MessageSource`, so the same run loop can pump a
//! Win32 message queue, a terminal, or an in-process queue.

pub mod queue;
pub mod terminal;

#[cfg(windows)]
pub mod win32;

pub use queue::{MessagePoster, QueueMessage, QueueSource};
pub use terminal::{RawModeGuard, TerminalMessage, TerminalSource};

#[cfg(windows)]
pub use win32::{Win32Message, Win32Source};
