use serde::{Deserialize, Serialize};
use std::time::Duration;

// ════════════════════════════════════════════════════════════════════
// Policy enums
// ════════════════════════════════════════════════════════════════════

/// How a wait duration is converted to the native timer unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeoutRounding {
    /// Drop the sub-unit remainder (integer division, like the Win32 runner).
    #[default]
    Truncate,
    /// Round up so the wait never ends before the wake time.
    Ceil,
}

/// What the loop does when a message source call fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Stop the loop and return the error from `run()`.
    #[default]
    Fatal,
    /// Log, skip the failed step, and keep iterating.
    LogAndContinue,
}

// ════════════════════════════════════════════════════════════════════
// RunLoopConfig
// ════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunLoopConfig {
    /// Native timer unit. Stored as whole milliseconds in config files.
    #[serde(with = "millis", rename = "timer_granularity_ms")]
    pub timer_granularity: Duration,
    pub timeout_rounding: TimeoutRounding,
    pub failure_policy: FailurePolicy,
    /// Consecutive failed iterations tolerated under `LogAndContinue`.
    pub max_consecutive_failures: u32,
}

impl Default for RunLoopConfig {
    fn default() -> Self {
        Self {
            timer_granularity: Duration::from_millis(1),
            timeout_rounding: TimeoutRounding::Truncate,
            failure_policy: FailurePolicy::Fatal,
            max_consecutive_failures: 8,
        }
    }
}

impl RunLoopConfig {
    pub fn with_rounding(mut self, rounding: TimeoutRounding) -> Self {
        self.timeout_rounding = rounding;
        self
    }

    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    pub fn with_granularity(mut self, granularity: Duration) -> Self {
        self.timer_granularity = granularity;
        self
    }
}

mod millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        let ms = u64::try_from(value.as_millis()).unwrap_or(u64::MAX);
        serializer.serialize_u64(ms)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
