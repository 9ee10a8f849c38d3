//! Dispatch target for native messages: counts them and keeps the latest one
//! so the heartbeat can report activity.

use crossterm::event::{Event, KeyModifiers};
use std::cell::RefCell;
use std::rc::Rc;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputStats {
    pub keys: u64,
    pub mouse: u64,
    pub resizes: u64,
    pub lines: u64,
    pub other: u64,
    pub last: Option<String>,
}

impl InputStats {
    pub fn total(&self) -> u64 {
        self.keys + self.mouse + self.resizes + self.lines + self.other
    }
}

/// Shared between the source's handler and the engine; both run on the loop
/// thread, so `Rc<RefCell>` is enough.
#[derive(Debug, Clone, Default)]
pub struct InputLog {
    stats: Rc<RefCell<InputStats>>,
}

impl InputLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_event(&self, event: &Event) {
        let mut stats = self.stats.borrow_mut();
        match event {
            Event::Key(_) => stats.keys += 1,
            Event::Mouse(_) => stats.mouse += 1,
            Event::Resize(_, _) => stats.resizes += 1,
            _ => stats.other += 1,
        }
        stats.last = Some(describe(event));
    }

    pub fn record_line(&self, line: &str) {
        let mut stats = self.stats.borrow_mut();
        stats.lines += 1;
        stats.last = Some(format!("line {:?}", line));
    }

    pub fn snapshot(&self) -> InputStats {
        self.stats.borrow().clone()
    }
}

/// One-line human description of a terminal event.
pub fn describe(event: &Event) -> String {
    match event {
        Event::Key(key) => {
            if key.modifiers.is_empty() || key.modifiers == KeyModifiers::SHIFT {
                format!("key {:?}", key.code)
            } else {
                format!("key {:?}+{:?}", key.modifiers, key.code)
            }
        }
        Event::Mouse(mouse) => format!("mouse {:?} at {},{}", mouse.kind, mouse.column, mouse.row),
        Event::Resize(cols, rows) => format!("resize {}x{}", cols, rows),
        Event::Paste(text) => format!("paste ({} chars)", text.chars().count()),
        Event::FocusGained => "focus gained".to_string(),
        Event::FocusLost => "focus lost".to_string(),
    }
}
