//! The native message source seam.
//!
//! A source wraps one platform's "wait for input or timeout" primitive, its
//! non-blocking peek, and its translate/dispatch pipeline. Backends live in
//! `cadence-io`; the loop only sees this trait.

use crate::error::SourceError;
use std::time::Duration;

/// A message pulled from a native queue.
pub trait NativeMessage {
    /// True for the termination signal (`WM_QUIT` and friends).
    fn is_quit(&self) -> bool;
}

pub trait MessageSource {
    type Message: NativeMessage;

    /// Blocks until an input-class message is available or `timeout` elapses.
    ///
    /// `None` means no wake time is scheduled: wait for input indefinitely.
    /// `Some(Duration::ZERO)` must return at once when nothing is pending.
    fn wait(&mut self, timeout: Option<Duration>) -> Result<(), SourceError>;

    /// Removes and returns the next queued message without blocking.
    fn try_next(&mut self) -> Result<Option<Self::Message>, SourceError>;

    /// Translates and routes a message through the source's normal handling.
    fn dispatch(&mut self, message: Self::Message) -> Result<(), SourceError>;
}

impl<S: MessageSource + ?Sized> MessageSource for &mut S {
    type Message = S::Message;

    fn wait(&mut self, timeout: Option<Duration>) -> Result<(), SourceError> {
        (**self).wait(timeout)
    }

    fn try_next(&mut self) -> Result<Option<Self::Message>, SourceError> {
        (**self).try_next()
    }

    fn dispatch(&mut self, message: Self::Message) -> Result<(), SourceError> {
        (**self).dispatch(message)
    }
}
