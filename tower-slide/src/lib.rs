//! # Tower Slide
//!
//! `tower-slide` gates a [Tower](https://github.com/tower-rs/tower) service
//! behind a shared [`slide_limit::SlidingLog`], so the inner service is never
//! called more often than the admission window allows.
//!
//! ## Behaviour
//!
//! [`AdmitService`] claims a slot in `poll_ready`. A free window costs one
//! non-blocking check; a saturated one parks the service on the limiter's own
//! blocking wait, which re-validates capacity on wake because concurrent
//! clones may have taken the freed slot first. Two knobs adjust this:
//!
//! 1. **Fail fast**: return [`SlideError::RateLimited`] immediately instead
//!    of queueing, for callers that prefer shedding to waiting.
//! 2. **Timeout**: a single deadline covering both the wait for admission and
//!    the inner call, failing with [`SlideError::Timeout`].
//!
//! Shutting the limiter down fails queued requests with
//! [`SlideError::Cancelled`].

mod error;
mod layer;
mod service;


pub use error::SlideError;
pub use layer::AdmitLayer;
pub use service::AdmitService;
