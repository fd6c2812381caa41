use std::collections::VecDeque;
use std::ops::ControlFlow;
use std::sync::Mutex;
use std::sync::PoisonError;
use std::time::Duration;

use quanta::Clock;
use quanta::Instant;
use tokio::sync::watch;

use super::AcquireError;
use super::ConfigError;
use super::Reason;
use super::Strategy;
use super::TimeUnit;

/// Padding added to a waiter's sleep so it wakes just after the oldest
/// admission has aged out, not a clock tick before it.
const WAKE_SLACK: Duration = Duration::from_millis(1);

/// A sliding-window admission log.
///
/// Holds the instants of the last up-to-`limit` admissions still inside the
/// window. Every check prunes aged-out entries and compares the remainder
/// against `limit` inside one critical section, so the capacity bound holds
/// under true parallelism. A slot frees exactly `window` after its admission
/// instant; nothing releases a slot early.
///
/// Waiters blocked in [`acquire`](SlidingLog::acquire) sleep with the lock
/// released and race for freed slots on wake. No arrival-order fairness is
/// guaranteed, only the capacity bound.
#[derive(Debug)]
pub struct SlidingLog {
    limit: usize,
    window_ns: u64,
    /// Admission instants as nanos from `anchor`, oldest first.
    admissions: Mutex<VecDeque<u64>>,
    clock: Clock,
    anchor: Instant,
    shutdown: watch::Sender<bool>,
}

impl SlidingLog {
    /// Creates a limiter granting at most `limit` admissions per rolling
    /// `window`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if `limit` is zero or `window` is zero.
    pub fn new(limit: usize, window: Duration) -> Result<Self, ConfigError> {
        if limit == 0 {
            return Err(ConfigError::ZeroLimit);
        }
        if window.is_zero() {
            return Err(ConfigError::ZeroWindow);
        }
        let clock = Clock::new();
        let anchor = clock.now();
        let (shutdown, _) = watch::channel(false);
        Ok(Self {
            limit,
            window_ns: window.as_nanos() as u64,
            admissions: Mutex::new(VecDeque::with_capacity(limit)),
            clock,
            anchor,
            shutdown,
        })
    }

    /// Creates a limiter granting `limit` admissions per one `unit` of time,
    /// e.g. `per_unit(10, TimeUnit::Second)` for ten per rolling second.
    pub fn per_unit(limit: usize, unit: TimeUnit) -> Result<Self, ConfigError> {
        Self::new(limit, unit.duration())
    }

    /// Waits until an admission slot is free, then claims it.
    ///
    /// Returns once admitted; the admission instant is recorded at that
    /// moment. If the window is saturated, the caller sleeps until the oldest
    /// admission is due to age out and then re-checks, because another waiter
    /// may have claimed the freed slot first.
    ///
    /// Dropping the returned future while waiting is safe: a waiter records
    /// nothing until it is actually admitted.
    ///
    /// # Errors
    ///
    /// Returns [`AcquireError::Cancelled`] if [`shutdown`](SlidingLog::shutdown)
    /// is called before this caller is admitted.
    pub async fn acquire(&self) -> Result<(), AcquireError> {
        let mut shutdown = self.shutdown.subscribe();
        loop {
            if *shutdown.borrow_and_update() {
                return Err(AcquireError::Cancelled);
            }

            let Reason::Saturated { retry_after } = match self.try_admit() {
                ControlFlow::Continue(()) => return Ok(()),
                ControlFlow::Break(reason) => reason,
            };

            tokio::select! {
                _ = tokio::time::sleep(retry_after.saturating_add(WAKE_SLACK)) => {}
                _ = shutdown.changed() => {}
            }
        }
    }

    /// Cancels every waiter currently blocked in [`acquire`](SlidingLog::acquire)
    /// and makes all future `acquire` calls fail with
    /// [`AcquireError::Cancelled`]. Idempotent.
    pub fn shutdown(&self) {
        self.shutdown.send_replace(true);
    }

    /// The configured admission limit.
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// The configured window length.
    pub fn window(&self) -> Duration {
        Duration::from_nanos(self.window_ns)
    }

    /// Number of admissions currently inside the window.
    pub fn in_window(&self) -> usize {
        let now = self.now_ns();
        let mut admissions = self.lock_admissions();
        Self::prune(&mut admissions, now, self.window_ns);
        admissions.len()
    }

    fn now_ns(&self) -> u64 {
        self.clock.now().duration_since(self.anchor).as_nanos() as u64
    }

    fn lock_admissions(&self) -> std::sync::MutexGuard<'_, VecDeque<u64>> {
        // A poisoning panic cannot leave the log inconsistent; every mutation
        // is a single push or pop.
        self.admissions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn prune(admissions: &mut VecDeque<u64>, now: u64, window_ns: u64) {
        while let Some(&oldest) = admissions.front() {
            if oldest + window_ns <= now {
                admissions.pop_front();
            } else {
                break;
            }
        }
    }
}

impl Strategy for SlidingLog {
    fn try_admit(&self) -> ControlFlow<Reason> {
        let now = self.now_ns();
        let mut admissions = self.lock_admissions();

        Self::prune(&mut admissions, now, self.window_ns);

        if admissions.len() < self.limit {
            admissions.push_back(now);
            ControlFlow::Continue(())
        } else {
            // Non-empty here since limit > 0.
            let retry_after = admissions
                .front()
                .map(|&oldest| Duration::from_nanos((oldest + self.window_ns).saturating_sub(now)))
                .unwrap_or_default();
            ControlFlow::Break(Reason::Saturated { retry_after })
        }
    }
}
