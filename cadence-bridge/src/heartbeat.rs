//! The demo engine.
//!
//! Beats once per interval and reports the next beat as its wake time, so an
//! idle loop sleeps exactly until the next beat is due.

use cadence_core::{Clock, Engine, SystemClock};
use chrono::{DateTime, Local};
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct Beat {
    pub number: u64,
    pub at: DateTime<Local>,
    /// How far past its due time the beat fired.
    pub late_by: Duration,
}

type BeatCallback = Box<dyn FnMut(&Beat)>;
type LimitCallback = Box<dyn FnOnce()>;

pub struct HeartbeatEngine<C = SystemClock> {
    clock: C,
    interval: Duration,
    next_beat: Instant,
    beats: u64,
    max_beats: Option<u64>,
    on_beat: Option<BeatCallback>,
    on_limit: Option<LimitCallback>,
}

impl<C> std::fmt::Debug for HeartbeatEngine<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HeartbeatEngine")
            .field("interval", &self.interval)
            .field("beats", &self.beats)
            .field("max_beats", &self.max_beats)
            .finish()
    }
}

impl HeartbeatEngine<SystemClock> {
    pub fn new(interval: Duration) -> Self {
        Self::with_clock(SystemClock, interval)
    }
}

impl<C: Clock> HeartbeatEngine<C> {
    /// The first beat is due one interval after creation. The interval is
    /// at least one millisecond.
    pub fn with_clock(clock: C, interval: Duration) -> Self {
        let interval = interval.max(Duration::from_millis(1));
        let next_beat = clock.now() + interval;
        Self {
            clock,
            interval,
            next_beat,
            beats: 0,
            max_beats: None,
            on_beat: None,
            on_limit: None,
        }
    }

    pub fn with_max_beats(mut self, max_beats: Option<u64>) -> Self {
        self.max_beats = max_beats;
        self
    }

    pub fn on_beat(mut self, callback: impl FnMut(&Beat) + 'static) -> Self {
        self.on_beat = Some(Box::new(callback));
        self
    }

    /// Called once, right after the last allowed beat. With a limit of zero it
    /// fires on the first call. Typically posts quit.
    pub fn on_limit(mut self, callback: impl FnOnce() + 'static) -> Self {
        self.on_limit = Some(Box::new(callback));
        self
    }

    pub fn beats(&self) -> u64 {
        self.beats
    }

    pub fn limit_reached(&self) -> bool {
        self.max_beats.is_some_and(|max| self.beats >= max)
    }

    fn beat(&mut self, now: Instant) {
        self.beats += 1;
        let beat = Beat {
            number: self.beats,
            at: Local::now(),
            late_by: now.saturating_duration_since(self.next_beat),
        };
        tracing::debug!(number = beat.number, late_by = ?beat.late_by, "💓 Heartbeat");

        if let Some(callback) = &mut self.on_beat {
            callback(&beat);
        }
        self.reschedule(now);
    }

    /// Moves the next beat one interval on. Missed beats are dropped, not replayed.
    fn reschedule(&mut self, now: Instant) {
        self.next_beat += self.interval;
        if self.next_beat <= now {
            self.next_beat = now + self.interval;
        }
    }

    fn fire_limit(&mut self) {
        if self.limit_reached() {
            if let Some(callback) = self.on_limit.take() {
                tracing::info!(beats = self.beats, "Beat limit reached");
                callback();
            }
        }
    }
}

impl<C: Clock> Engine for HeartbeatEngine<C> {
    /// Past the limit the schedule keeps moving but nothing fires, so the
    /// returned wake time is always in the future.
    fn process_messages(&mut self) -> Instant {
        let now = self.clock.now();
        if now >= self.next_beat {
            if self.limit_reached() {
                self.reschedule(now);
            } else {
                self.beat(now);
            }
        }
        self.fire_limit();
        self.next_beat
    }
}
