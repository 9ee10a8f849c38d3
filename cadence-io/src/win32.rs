// cadence-io/src/win32.rs
//! The thread's Win32 message queue.
//!
//! Mirrors the classic desktop runner loop: `MsgWaitForMultipleObjects` with
//! `QS_ALLINPUT` as the wait primitive, `PeekMessageW(PM_REMOVE)` to drain,
//! `TranslateMessage` + `DispatchMessageW` to hand messages to window procs.

use cadence_core::timing::native_millis;
use cadence_core::{MessageSource, NativeMessage, SourceError};
use std::io;
use std::time::Duration;

use windows::Win32::Foundation::{FALSE, HWND, WAIT_FAILED};
use windows::Win32::UI::WindowsAndMessaging::{
    DispatchMessageW, MSG, MsgWaitForMultipleObjects, PM_REMOVE, PeekMessageW, PostQuitMessage,
    QS_ALLINPUT, TranslateMessage, WM_QUIT,
};

#[derive(Debug, Clone, Copy)]
pub struct Win32Message(pub MSG);

impl NativeMessage for Win32Message {
    fn is_quit(&self) -> bool {
        self.0.message == WM_QUIT
    }
}

/// Pumps the message queue of the thread that calls `wait`.
///
/// Message queues are per thread: build and run this on the thread that owns
/// the windows.
#[derive(Debug, Default)]
pub struct Win32Source {
    _not_send: std::marker::PhantomData<*const ()>,
}

impl Win32Source {
    pub fn new() -> Self {
        tracing::info!("🪟 Win32 message source created");
        Self::default()
    }
}

/// Posts `WM_QUIT` to the calling thread's queue.
pub fn post_quit_message(exit_code: i32) {
    unsafe { PostQuitMessage(exit_code) };
}

impl MessageSource for Win32Source {
    type Message = Win32Message;

    fn wait(&mut self, timeout: Option<Duration>) -> Result<(), SourceError> {
        let millis = native_millis(timeout);
        let result = unsafe { MsgWaitForMultipleObjects(None, FALSE, millis, QS_ALLINPUT) };
        if result == WAIT_FAILED {
            return Err(SourceError::Wait(io::Error::last_os_error()));
        }
        Ok(())
    }

    fn try_next(&mut self) -> Result<Option<Win32Message>, SourceError> {
        let mut message = MSG::default();
        let found = unsafe { PeekMessageW(&mut message, HWND::default(), 0, 0, PM_REMOVE) };
        Ok(found.as_bool().then_some(Win32Message(message)))
    }

    fn dispatch(&mut self, message: Win32Message) -> Result<(), SourceError> {
        unsafe {
            let _ = TranslateMessage(&message.0);
            DispatchMessageW(&message.0);
        }
        Ok(())
    }
}
