//! # slide-limit
//!
//! `slide-limit` provides a concurrency-safe sliding-window admission limiter.
//!
//! ## Core Philosophy
//!
//! The limiter keeps an exact log of recent admission instants rather than an
//! approximate counter. That makes it slightly heavier than a counter-based
//! window, but it gives a hard guarantee: across any set of concurrent
//! callers, no more than `limit` admissions are granted inside any rolling
//! `window`-length slice of time.
//!
//! ## Key Concepts
//!
//! * **Admission Log**: a bounded record of the last up-to-`limit` admission
//!   instants, pruned as entries age out of the window.
//! * **Blocking `acquire`**: callers suspend until a slot frees, then race to
//!   re-check the log; a freed slot is never granted without re-validating
//!   capacity.
//! * **Strategy Trait**: the non-blocking admission check behind a trait,
//!   usable on its own when callers would rather shed load than wait.
//!
//! ## Example
//!
//! ```rust
//! use slide_limit::SlidingLog;
//! use std::time::Duration;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let limiter = SlidingLog::new(100, Duration::from_secs(60)).unwrap();
//!
//! limiter.acquire().await.unwrap();
//! // Admitted; at most 100 callers get here per rolling minute.
//! # }
//! ```

use std::fmt::Debug;
use std::ops::ControlFlow;
use std::time::Duration;

mod sliding_log;
mod unit;

pub use sliding_log::SlidingLog;
pub use unit::TimeUnit;

/// Reasons why an admission attempt might be denied.
#[derive(Debug, PartialEq)]
pub enum Reason {
    /// The window already holds `limit` admissions; `retry_after` is the time
    /// until the oldest of them ages out.
    Saturated { retry_after: Duration },
}

/// Errors rejected at limiter construction.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// `limit` must admit at least one caller per window.
    #[error("admission limit must be greater than zero")]
    ZeroLimit,

    /// A zero-length window would make every admission instantly stale.
    #[error("window duration must be greater than zero")]
    ZeroWindow,
}

/// Errors surfaced by a waiting `acquire` call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AcquireError {
    /// The limiter was shut down while this caller was waiting. The caller
    /// was never admitted and left no entry in the admission log.
    #[error("limiter shut down while waiting for admission")]
    Cancelled,
}

/// The non-blocking admission check.
///
/// Strategies must be `Send` and `Sync` to allow sharing across thread
/// boundaries via `Arc`.
pub trait Strategy: Debug {
    /// Attempts to claim one admission slot without waiting.
    ///
    /// The whole check (prune, compare, record) happens as a single atomic
    /// step, so two callers can never both observe a free slot.
    ///
    /// # Errors
    ///
    /// Returns `Reason` if the window is already at capacity.
    fn try_admit(&self) -> ControlFlow<Reason>;
}
