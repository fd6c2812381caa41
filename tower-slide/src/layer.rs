use std::sync::Arc;
use std::time::Duration;

use tower::Layer;

use slide_limit::SlidingLog;

use crate::service::AdmitService;

/// Applies admission control to services using a shared [`SlidingLog`].
///
/// Every service produced by this layer draws from the same window, so the
/// limit holds across clones and across distinct stacks built from one layer.
#[derive(Clone, Debug)]
pub struct AdmitLayer {
    limiter: Arc<SlidingLog>,
    fail_fast: bool,
    timeout: Option<Duration>,
}

impl AdmitLayer {
    pub fn new(limiter: Arc<SlidingLog>) -> Self {
        AdmitLayer {
            limiter,
            fail_fast: false,
            timeout: None,
        }
    }

    /// Set whether the service should fail immediately when saturated.
    ///
    /// If `true`, the service will return `SlideError::RateLimited` instead
    /// of waiting for the oldest admission to age out of the window.
    pub fn with_fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }

    /// Set a unified timeout for both waiting for admission and request
    /// execution.
    ///
    /// If the total time exceeds this duration, the service will return
    /// `SlideError::Timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

impl<S> Layer<S> for AdmitLayer {
    type Service = AdmitService<S>;

    fn layer(&self, service: S) -> Self::Service {
        let mut svc =
            AdmitService::new(service, Arc::clone(&self.limiter)).with_fail_fast(self.fail_fast);
        if let Some(timeout) = self.timeout {
            svc = svc.with_timeout(timeout);
        }
        svc
    }
}
