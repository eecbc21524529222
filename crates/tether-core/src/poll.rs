//! Retry-with-deadline primitive used for every bounded wait.
//!
//! The wait is driven by an injected [`Clock`] so tests can advance time
//! without sleeping.

use std::time::Duration;

use chrono::{DateTime, Utc};

/// Default interval between polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Default wall-clock bound for one wait.
pub const DEFAULT_POLL_TIMEOUT: Duration = Duration::from_secs(120);

/// Source of time for polling and deployment naming.
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
    fn sleep(&self, duration: Duration);
}

/// Wall-clock time with a blocking sleep.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Interval and bounds for one wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub timeout: Duration,
    /// Optional cap on check attempts, applied in addition to the timeout.
    pub max_attempts: Option<u32>,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            timeout: DEFAULT_POLL_TIMEOUT,
            max_attempts: None,
        }
    }
}

impl PollPolicy {
    pub fn new(interval: Duration, timeout: Duration) -> Self {
        Self {
            interval,
            timeout,
            max_attempts: None,
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }
}

/// Result of a bounded wait.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome<T> {
    Ready(T),
    TimedOut { attempts: u32 },
}

/// Deadline `timeout` from now, or an error if it is not representable.
pub fn deadline_after(clock: &dyn Clock, timeout: Duration) -> anyhow::Result<DateTime<Utc>> {
    let timeout = chrono::Duration::from_std(timeout)
        .map_err(|e| anyhow::anyhow!("Poll timeout out of range: {}", e))?;
    clock
        .now()
        .checked_add_signed(timeout)
        .ok_or_else(|| anyhow::anyhow!("Poll timeout out of range: {:?}", timeout))
}

/// Check until it yields a value, `deadline` passes or the attempt cap is hit.
///
/// Each iteration sleeps for `policy.interval` first, then checks only while the
/// clock is still strictly before the deadline. A check returning `Ok(None)`
/// means "not yet"; a check error is returned immediately without further polls.
/// `policy.timeout` is ignored here.
pub fn poll_until_deadline<T, F>(
    clock: &dyn Clock,
    deadline: DateTime<Utc>,
    policy: &PollPolicy,
    mut check: F,
) -> anyhow::Result<PollOutcome<T>>
where
    F: FnMut(u32) -> anyhow::Result<Option<T>>,
{
    let mut attempts = 0u32;

    loop {
        if let Some(max) = policy.max_attempts
            && attempts >= max
        {
            return Ok(PollOutcome::TimedOut { attempts });
        }

        clock.sleep(policy.interval);
        if clock.now() >= deadline {
            return Ok(PollOutcome::TimedOut { attempts });
        }

        attempts += 1;
        if let Some(value) = check(attempts)? {
            return Ok(PollOutcome::Ready(value));
        }
    }
}
