use std::fmt;
use std::future::Future;
use std::ops::ControlFlow;
use std::pin::Pin;
use std::sync::Arc;
use std::task::Context;
use std::task::Poll;
use std::time::Duration;

use opentelemetry::global;
use opentelemetry::metrics::Counter;
use pin_project_lite::pin_project;
use tokio::time::Instant;
use tokio::time::Sleep;
use tokio::time::sleep;
use tower::BoxError;
use tower::Service;

use slide_limit::AcquireError;
use slide_limit::Reason;
use slide_limit::SlidingLog;
use slide_limit::Strategy;

use crate::error::SlideError;

/// The in-flight admission wait, already bounded by the configured timeout.
type AdmitFuture = Pin<Box<dyn Future<Output = Result<(), SlideError>> + Send>>;

/// A service that admits requests to its inner service through a shared
/// [`SlidingLog`].
///
/// A permit is claimed in `poll_ready`. When the window has room the claim is
/// a single non-blocking check; when it is saturated the service parks on the
/// limiter's own `acquire` future, which wakes once the oldest admission ages
/// out and re-validates capacity against concurrently admitted clones.
pub struct AdmitService<S> {
    inner: S,
    limiter: Arc<SlidingLog>,
    waiting: Option<AdmitFuture>,
    permit: bool,
    fail_fast: bool,
    timeout: Option<Duration>,
    wait_start: Option<Instant>,
    admission_waits: Counter<u64>,
}

pin_project! {
    /// Response future that enforces what is left of the unified deadline.
    pub struct ResponseFuture<F> {
        #[pin]
        inner: F,
        #[pin]
        deadline: Option<Sleep>,
    }
}

impl<F, T, E> Future for ResponseFuture<F>
where
    F: Future<Output = Result<T, E>>,
    E: From<BoxError>,
{
    type Output = Result<T, E>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.project();
        if let Some(deadline) = this.deadline.as_pin_mut()
            && deadline.poll(cx).is_ready()
        {
            return Poll::Ready(Err(E::from(Box::new(SlideError::Timeout))));
        }
        this.inner.poll(cx)
    }
}

impl<S> AdmitService<S> {
    pub fn new(inner: S, limiter: Arc<SlidingLog>) -> Self {
        let meter = global::meter("admit_service");

        Self {
            inner,
            limiter,
            waiting: None,
            permit: false,
            fail_fast: false,
            timeout: None,
            wait_start: None,
            admission_waits: meter.u64_counter("admission_waits").build(),
        }
    }

    pub fn with_fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Builds the wait for a saturated window out of the limiter's blocking
    /// primitive, capping it with the timeout budget when one is configured.
    fn queue_for_admission(&self) -> AdmitFuture {
        let limiter = Arc::clone(&self.limiter);
        match self.timeout {
            Some(budget) => Box::pin(async move {
                match tokio::time::timeout(budget, limiter.acquire()).await {
                    Ok(Ok(())) => Ok(()),
                    Ok(Err(AcquireError::Cancelled)) => Err(SlideError::Cancelled),
                    Err(_) => Err(SlideError::Timeout),
                }
            }),
            None => Box::pin(async move {
                limiter
                    .acquire()
                    .await
                    .map_err(|AcquireError::Cancelled| SlideError::Cancelled)
            }),
        }
    }
}

impl<S, Req> Service<Req> for AdmitService<S>
where
    S: Service<Req, Error = BoxError>,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = ResponseFuture<S::Future>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        // Drive an admission wait that is already in flight.
        if let Some(fut) = self.waiting.as_mut() {
            match fut.as_mut().poll(cx) {
                Poll::Ready(Ok(())) => {
                    self.waiting = None;
                    self.permit = true;
                }
                Poll::Ready(Err(e)) => {
                    self.waiting = None;
                    self.wait_start = None;
                    return Poll::Ready(Err(Box::new(e)));
                }
                Poll::Pending => return Poll::Pending,
            }
        }

        // The inner service must be ready before a slot is worth claiming,
        // otherwise a stalled service burns admissions.
        match self.inner.poll_ready(cx) {
            Poll::Pending => return Poll::Pending,
            Poll::Ready(Err(e)) => return Poll::Ready(Err(e)),
            Poll::Ready(Ok(())) => {}
        }

        if self.permit {
            return Poll::Ready(Ok(()));
        }

        match self.limiter.try_admit() {
            ControlFlow::Continue(()) => {
                self.permit = true;
                Poll::Ready(Ok(()))
            }
            ControlFlow::Break(Reason::Saturated { retry_after }) => {
                if self.fail_fast {
                    return Poll::Ready(Err(Box::new(SlideError::RateLimited { retry_after })));
                }

                self.admission_waits.add(1, &[]);
                self.wait_start.get_or_insert_with(Instant::now);

                let mut fut = self.queue_for_admission();
                match fut.as_mut().poll(cx) {
                    Poll::Ready(Ok(())) => {
                        self.permit = true;
                        Poll::Ready(Ok(()))
                    }
                    Poll::Ready(Err(e)) => {
                        self.wait_start = None;
                        Poll::Ready(Err(Box::new(e)))
                    }
                    Poll::Pending => {
                        self.waiting = Some(fut);
                        Poll::Pending
                    }
                }
            }
        }
    }

    fn call(&mut self, req: Req) -> Self::Future {
        self.permit = false;
        // Whatever the admission wait consumed comes out of the execution
        // budget, so one timeout bounds the whole request.
        let spent = self
            .wait_start
            .take()
            .map(|start| start.elapsed())
            .unwrap_or_default();
        let deadline = self
            .timeout
            .map(|budget| sleep(budget.saturating_sub(spent)));

        ResponseFuture {
            inner: self.inner.call(req),
            deadline,
        }
    }
}

// Clones share the limiter but start with no claimed permit or queued wait.
impl<S> Clone for AdmitService<S>
where
    S: Clone,
{
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            limiter: Arc::clone(&self.limiter),
            waiting: None,
            permit: false,
            fail_fast: self.fail_fast,
            timeout: self.timeout,
            wait_start: None,
            admission_waits: self.admission_waits.clone(),
        }
    }
}

impl<S> fmt::Debug for AdmitService<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdmitService")
            .field("limiter", &self.limiter)
            .field("permit", &self.permit)
            .field("fail_fast", &self.fail_fast)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}
