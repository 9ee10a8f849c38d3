// cadence-io/src/queue.rs
//! In-process message queue.
//!
//! The headless counterpart of a native thread message queue: any thread can
//! post into it through a `MessagePoster`, and the run loop's thread waits on
//! it with a timeout. Waiting runs on a private current-thread tokio runtime
//! so `tokio::time::timeout` can bound `recv()`.

use cadence_core::{MessageSource, NativeMessage, SourceError};
use std::collections::VecDeque;
use std::fmt;
use std::time::Duration;
use tokio::runtime::{Builder, Runtime};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender, error::TryRecvError};

// ════════════════════════════════════════════════════════════════════
// Messages
// ════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueueMessage<T> {
    Post(T),
    Quit,
}

impl<T> NativeMessage for QueueMessage<T> {
    fn is_quit(&self) -> bool {
        matches!(self, QueueMessage::Quit)
    }
}

// ════════════════════════════════════════════════════════════════════
// MessagePoster
// ════════════════════════════════════════════════════════════════════

/// Sending half of a `QueueSource`. Cheap to clone, usable from any thread.
pub struct MessagePoster<T> {
    tx: UnboundedSender<QueueMessage<T>>,
}

impl<T> Clone for MessagePoster<T> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

impl<T> fmt::Debug for MessagePoster<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MessagePoster")
            .field("closed", &self.tx.is_closed())
            .finish()
    }
}

impl<T> MessagePoster<T> {
    pub fn post(&self, message: T) -> Result<(), SourceError> {
        self.send(QueueMessage::Post(message))
    }

    /// Asks the run loop to stop. Messages posted after this are never seen.
    pub fn post_quit(&self) -> Result<(), SourceError> {
        self.send(QueueMessage::Quit)
    }

    fn send(&self, message: QueueMessage<T>) -> Result<(), SourceError> {
        self.tx
            .send(message)
            .map_err(|_| SourceError::Disconnected)
    }
}

// ════════════════════════════════════════════════════════════════════
// QueueSource
// ════════════════════════════════════════════════════════════════════

type Handler<T> = Box<dyn FnMut(T)>;

enum WaitOutcome<T> {
    Received(QueueMessage<T>),
    TimedOut,
    Closed,
}

pub struct QueueSource<T> {
    rx: UnboundedReceiver<QueueMessage<T>>,
    // Messages pulled off the channel while waiting, not yet drained.
    pending: VecDeque<QueueMessage<T>>,
    runtime: Runtime,
    handler: Option<Handler<T>>,
    disconnected: bool,
}

impl<T> fmt::Debug for QueueSource<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueueSource")
            .field("pending", &self.pending.len())
            .field("has_handler", &self.handler.is_some())
            .field("disconnected", &self.disconnected)
            .finish()
    }
}

impl<T> QueueSource<T> {
    pub fn new() -> Result<(Self, MessagePoster<T>), SourceError> {
        let runtime = Builder::new_current_thread()
            .enable_time()
            .build()
            .map_err(SourceError::Setup)?;
        let (tx, rx) = mpsc::unbounded_channel();

        tracing::info!("📬 Queue message source created");

        let source = Self {
            rx,
            pending: VecDeque::new(),
            runtime,
            handler: None,
            disconnected: false,
        };
        Ok((source, MessagePoster { tx }))
    }

    /// Installs the handler every dispatched message is routed to.
    pub fn with_handler(mut self, handler: impl FnMut(T) + 'static) -> Self {
        self.set_handler(handler);
        self
    }

    pub fn set_handler(&mut self, handler: impl FnMut(T) + 'static) {
        self.handler = Some(Box::new(handler));
    }

    /// True once every `MessagePoster` has been dropped and the queue is empty.
    pub fn is_disconnected(&self) -> bool {
        self.disconnected && self.pending.is_empty()
    }

    fn poll_channel(&mut self) -> Option<QueueMessage<T>> {
        match self.rx.try_recv() {
            Ok(message) => Some(message),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                self.disconnected = true;
                None
            }
        }
    }
}

impl<T> MessageSource for QueueSource<T> {
    type Message = QueueMessage<T>;

    fn wait(&mut self, timeout: Option<Duration>) -> Result<(), SourceError> {
        if !self.pending.is_empty() {
            return Ok(());
        }
        if let Some(message) = self.poll_channel() {
            self.pending.push_back(message);
            return Ok(());
        }

        // No poster left: only the timeout can end this wait.
        if self.disconnected {
            return match timeout {
                None => Err(SourceError::Disconnected),
                Some(timeout) => {
                    if !timeout.is_zero() {
                        self.runtime.block_on(async move { tokio::time::sleep(timeout).await });
                    }
                    Ok(())
                }
            };
        }

        if timeout == Some(Duration::ZERO) {
            return Ok(());
        }

        let rx = &mut self.rx;
        let outcome = self.runtime.block_on(async move {
            let received = match timeout {
                Some(timeout) => match tokio::time::timeout(timeout, rx.recv()).await {
                    Ok(received) => received,
                    Err(_) => return WaitOutcome::TimedOut,
                },
                None => rx.recv().await,
            };
            match received {
                Some(message) => WaitOutcome::Received(message),
                None => WaitOutcome::Closed,
            }
        });

        match outcome {
            WaitOutcome::Received(message) => self.pending.push_back(message),
            WaitOutcome::TimedOut => {}
            WaitOutcome::Closed => {
                self.disconnected = true;
                if timeout.is_none() {
                    return Err(SourceError::Disconnected);
                }
            }
        }
        Ok(())
    }

    fn try_next(&mut self) -> Result<Option<Self::Message>, SourceError> {
        if let Some(message) = self.pending.pop_front() {
            return Ok(Some(message));
        }
        Ok(self.poll_channel())
    }

    fn dispatch(&mut self, message: Self::Message) -> Result<(), SourceError> {
        match message {
            QueueMessage::Post(payload) => match &mut self.handler {
                Some(handler) => handler(payload),
                None => tracing::trace!("Queue message dropped: no handler installed"),
            },
            QueueMessage::Quit => {}
        }
        Ok(())
    }
}
