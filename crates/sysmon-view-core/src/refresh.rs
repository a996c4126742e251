//! Auto-refresh scheduling with generation fencing.
//!
//! Timers are never cancelled. Each scheduled refresh captures the
//! generation counter when it is armed; arming bumps the counter, and so
//! does every manual refresh. When a timer fires it is honoured only if
//! `captured + 1` still equals the current generation. At most one pending
//! refresh can therefore be current.

use crate::error::ConfigError;
use std::time::Duration;

/// Default auto-refresh interval in seconds.
pub const DEFAULT_INTERVAL_SECONDS: u32 = 120;

/// A one-shot refresh the host must schedule after `delay`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduledRefresh {
    /// Generation captured when armed
    pub captured: u64,
    /// Delay before firing
    pub delay: Duration,
}

/// Auto-refresh state for one page.
#[derive(Debug, Clone)]
pub struct RefreshScheduler {
    enabled: bool,
    interval_seconds: u32,
    generation: u64,
    /// File-loaded pages never schedule
    live: bool,
}

impl Default for RefreshScheduler {
    fn default() -> Self {
        Self::new(true)
    }
}

impl RefreshScheduler {
    /// Create a disabled scheduler with the default interval.
    #[must_use]
    pub const fn new(live: bool) -> Self {
        Self {
            enabled: false,
            interval_seconds: DEFAULT_INTERVAL_SECONDS,
            generation: 0,
            live,
        }
    }

    /// Whether auto-refresh is on.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Interval in seconds.
    #[must_use]
    pub const fn interval_seconds(&self) -> u32 {
        self.interval_seconds
    }

    /// Current generation.
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// Turn auto-refresh on or off and re-evaluate scheduling.
    pub fn set_auto_refresh(&mut self, enabled: bool) -> Option<ScheduledRefresh> {
        self.enabled = enabled;
        self.arm()
    }

    /// Change the interval and re-evaluate scheduling.
    pub fn set_interval_seconds(
        &mut self,
        seconds: u32,
    ) -> Result<Option<ScheduledRefresh>, ConfigError> {
        if seconds == 0 {
            return Err(ConfigError::InvalidInterval(seconds));
        }
        self.interval_seconds = seconds;
        Ok(self.arm())
    }

    /// Schedule the next refresh if enabled and live.
    ///
    /// Supersedes any refresh scheduled earlier.
    pub fn arm(&mut self) -> Option<ScheduledRefresh> {
        if !self.enabled || !self.live {
            return None;
        }
        let scheduled = ScheduledRefresh {
            captured: self.generation,
            delay: Duration::from_secs(u64::from(self.interval_seconds)),
        };
        self.generation += 1;
        tracing::debug!(
            generation = self.generation,
            delay_s = self.interval_seconds,
            "auto-refresh armed"
        );
        Some(scheduled)
    }

    /// Invalidate any pending scheduled refresh.
    ///
    /// While disabled nothing can be current, so the generation stays put.
    pub fn note_manual_refresh(&mut self) {
        if self.enabled && self.live {
            self.generation += 1;
        }
    }

    /// Whether a fired timer should still refresh.
    #[must_use]
    pub const fn is_current(&self, scheduled: &ScheduledRefresh) -> bool {
        self.enabled && self.live && scheduled.captured + 1 == self.generation
    }
}

/// Tickets for in-flight requests; only the latest ticket's response applies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RequestFence {
    latest: u64,
}

impl RequestFence {
    /// Create a fence with no requests issued.
    #[must_use]
    pub const fn new() -> Self {
        Self { latest: 0 }
    }

    /// Issue a ticket for a new request; earlier tickets become stale.
    pub fn issue(&mut self) -> u64 {
        self.latest += 1;
        self.latest
    }

    /// Invalidate every outstanding ticket.
    pub fn invalidate(&mut self) {
        self.latest += 1;
    }

    /// Whether a response carrying `ticket` may be applied.
    #[must_use]
    pub const fn accepts(&self, ticket: u64) -> bool {
        ticket == self.latest
    }
}
