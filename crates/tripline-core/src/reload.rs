//! Reload debounce coordinator.
//!
//! Rate-limits "refresh support data from the server" triggers so one
//! burst of chat/ticket pushes collapses into a bounded number of
//! fetches. Trailing-edge debounce: triggers inside the window re-arm a
//! single deadline; the reload fires once when the deadline finally
//! lapses without a new trigger.
//!
//! Pure state machine: callers pass time in, `trigger`/`tick` return
//! whether to execute a reload now, and `complete` closes the in-flight
//! window.

use std::time::Duration;

/// Minimum spacing between two reload executions. Matches the observed
/// burst cadence of rapid successive pushes.
pub const DEFAULT_DEBOUNCE_WINDOW: Duration = Duration::from_millis(2000);

/// Settle delay applied to triggers caused by our own send receipts, so
/// the originating write lands server-side before the thread re-fetch.
pub const DEFAULT_POST_SEND_SETTLE: Duration = Duration::from_millis(500);

/// Coordinator configuration. Defaults are configurable observations,
/// not hard requirements.
#[derive(Debug, Clone)]
pub struct ReloadConfig {
    /// Minimum spacing between reload executions.
    pub debounce_window: Duration,
    /// Settle delay before a receipt-triggered reload.
    pub post_send_settle: Duration,
}

impl Default for ReloadConfig {
    fn default() -> Self {
        Self {
            debounce_window: DEFAULT_DEBOUNCE_WINDOW,
            post_send_settle: DEFAULT_POST_SEND_SETTLE,
        }
    }
}

/// Trailing-edge debounce coordinator for support-data reloads.
///
/// Guarantees:
///
/// - at least `debounce_window` elapses between two executions
/// - k triggers over T ms execute at most `ceil(T / window) + 1` reloads
/// - at most one reload is conceptually in flight; a trigger during an
///   execution is queued and satisfied by one rearmed trailing reload
#[derive(Debug, Clone)]
pub struct ReloadCoordinator<I>
where
    I: Copy + Ord + std::ops::Add<Duration, Output = I>,
{
    config: ReloadConfig,
    /// When the last reload execution started. `None` before the first.
    last_reload_at: Option<I>,
    /// Armed trailing deadline. Re-armed by every in-window trigger.
    deadline: Option<I>,
    /// A trigger arrived while a reload was executing.
    pending: bool,
    /// A reload is currently executing.
    in_flight: bool,
}

impl<I> ReloadCoordinator<I>
where
    I: Copy + Ord + std::ops::Add<Duration, Output = I>,
{
    /// Create an idle coordinator.
    #[must_use]
    pub fn new(config: ReloadConfig) -> Self {
        Self { config, last_reload_at: None, deadline: None, pending: false, in_flight: false }
    }

    /// A support/chat push wants fresh thread data.
    ///
    /// Returns `true` when the caller must execute the reload now; `false`
    /// when the trigger was coalesced into the trailing deadline.
    pub fn trigger(&mut self, now: I) -> bool {
        self.trigger_with_settle(now, Duration::ZERO)
    }

    /// Same as [`ReloadCoordinator::trigger`] for our own send receipts:
    /// applies the post-send settle delay before any execution.
    pub fn trigger_post_send(&mut self, now: I) -> bool {
        self.trigger_with_settle(now, self.config.post_send_settle)
    }

    fn trigger_with_settle(&mut self, now: I, settle: Duration) -> bool {
        if self.in_flight {
            self.pending = true;
            return false;
        }

        let window_clear = self
            .last_reload_at
            .is_none_or(|last| now >= last + self.config.debounce_window);

        if window_clear && settle.is_zero() {
            self.begin(now);
            return true;
        }

        // Trailing arm: the timer resets on every trigger that arrives
        // before it fires. Inside the window the full window applies;
        // a settle delay can only lengthen it.
        let delay = if window_clear { settle } else { self.config.debounce_window.max(settle) };
        self.deadline = Some(now + delay);
        false
    }

    /// Fire the trailing deadline once it lapses.
    ///
    /// Returns `true` when the caller must execute the reload now.
    pub fn tick(&mut self, now: I) -> bool {
        if self.in_flight {
            return false;
        }
        let due = self.deadline.is_some_and(|d| now >= d);
        if !due {
            return false;
        }
        self.begin(now);
        true
    }

    /// The in-flight reload finished (successfully or not).
    ///
    /// A trigger that arrived while executing is satisfied by one trailing
    /// reload a full window after the execution started - never by a
    /// concurrent second fetch.
    pub fn complete(&mut self, _now: I) {
        self.in_flight = false;
        if self.pending {
            self.pending = false;
            if self.deadline.is_none() {
                self.deadline = self.last_reload_at.map(|last| last + self.config.debounce_window);
            }
        }
    }

    /// Drop any armed deadline and queued trigger. Used on explicit
    /// disconnect so no reload timer outlives the session's connection.
    /// An already-executing reload still gets its `complete` call.
    pub fn cancel_pending(&mut self) {
        self.deadline = None;
        self.pending = false;
    }

    /// True while a reload is executing.
    #[must_use]
    pub fn in_flight(&self) -> bool {
        self.in_flight
    }

    /// Armed trailing deadline, if any. Drivers may use this to pick a
    /// tick cadence; correctness only needs ticks at window granularity.
    #[must_use]
    pub fn next_deadline(&self) -> Option<I> {
        self.deadline
    }

    fn begin(&mut self, now: I) {
        self.last_reload_at = Some(now);
        self.deadline = None;
        self.pending = false;
        self.in_flight = true;
    }
}
