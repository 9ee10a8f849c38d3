//! Terminal input as a native message source.
//!
//! crossterm's `poll(timeout)` is the wait primitive; `poll(0)` + `read()`
//! is the non-blocking peek. Ctrl+C and Ctrl+D become the quit message, since
//! raw mode stops the terminal from turning them into signals.

use cadence_core::{MessageSource, NativeMessage, SourceError};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal;
use std::io;
use std::time::Duration;

// crossterm adds the timeout to `Instant::now()`, so "forever" is chunked.
const FOREVER_SLICE: Duration = Duration::from_secs(3600);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TerminalMessage {
    Input(Event),
    Quit,
}

impl NativeMessage for TerminalMessage {
    fn is_quit(&self) -> bool {
        matches!(self, TerminalMessage::Quit)
    }
}

impl From<Event> for TerminalMessage {
    fn from(event: Event) -> Self {
        if is_quit_event(&event) {
            TerminalMessage::Quit
        } else {
            TerminalMessage::Input(event)
        }
    }
}

/// Ctrl+C or Ctrl+D, on key press only (Windows also reports releases).
pub fn is_quit_event(event: &Event) -> bool {
    match event {
        Event::Key(KeyEvent {
            code: KeyCode::Char(c),
            modifiers,
            kind: KeyEventKind::Press,
            ..
        }) => modifiers.contains(KeyModifiers::CONTROL) && matches!(c, 'c' | 'd'),
        _ => false,
    }
}

// ────────────────────────────────────────────────────────────────
// Raw mode guard
// ────────────────────────────────────────────────────────────────

/// Keeps the terminal in raw mode for as long as it lives.
#[derive(Debug)]
pub struct RawModeGuard {
    _private: (),
}

impl RawModeGuard {
    pub fn enable() -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        Ok(Self { _private: () })
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        if let Err(e) = terminal::disable_raw_mode() {
            tracing::warn!("Failed to restore terminal mode: {}", e);
        }
    }
}

// ────────────────────────────────────────────────────────────────
// TerminalSource
// ────────────────────────────────────────────────────────────────

type Handler = Box<dyn FnMut(&Event)>;

pub struct TerminalSource {
    raw_mode: Option<RawModeGuard>,
    handler: Option<Handler>,
}

impl std::fmt::Debug for TerminalSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TerminalSource")
            .field("raw_mode", &self.raw_mode.is_some())
            .field("has_handler", &self.handler.is_some())
            .finish()
    }
}

impl TerminalSource {
    /// Puts the terminal in raw mode; it is restored when the source drops.
    pub fn new() -> Result<Self, SourceError> {
        let guard = RawModeGuard::enable().map_err(SourceError::Setup)?;
        tracing::info!("⌨️ Terminal message source created (raw mode)");
        Ok(Self {
            raw_mode: Some(guard),
            handler: None,
        })
    }

    /// Leaves the terminal mode alone (line-buffered input, signals intact).
    pub fn cooked() -> Self {
        tracing::info!("⌨️ Terminal message source created");
        Self {
            raw_mode: None,
            handler: None,
        }
    }

    pub fn with_handler(mut self, handler: impl FnMut(&Event) + 'static) -> Self {
        self.handler = Some(Box::new(handler));
        self
    }

    pub fn is_raw(&self) -> bool {
        self.raw_mode.is_some()
    }
}

impl MessageSource for TerminalSource {
    type Message = TerminalMessage;

    fn wait(&mut self, timeout: Option<Duration>) -> Result<(), SourceError> {
        match timeout {
            Some(timeout) => {
                event::poll(timeout).map_err(SourceError::Wait)?;
            }
            None => while !event::poll(FOREVER_SLICE).map_err(SourceError::Wait)? {},
        }
        Ok(())
    }

    fn try_next(&mut self) -> Result<Option<TerminalMessage>, SourceError> {
        if !event::poll(Duration::ZERO).map_err(SourceError::Retrieve)? {
            return Ok(None);
        }
        let event = event::read().map_err(SourceError::Retrieve)?;
        Ok(Some(TerminalMessage::from(event)))
    }

    fn dispatch(&mut self, message: TerminalMessage) -> Result<(), SourceError> {
        if let TerminalMessage::Input(event) = message {
            if let Some(handler) = &mut self.handler {
                handler(&event);
            }
        }
        Ok(())
    }
}
