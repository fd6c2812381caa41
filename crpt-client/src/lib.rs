//! # crpt-client
//!
//! A rate-limited client for the CRPT document-creation API.
//!
//! The interesting part lives in [`slide_limit`]: a sliding-window admission
//! log that bounds how many submissions may start per rolling window across
//! any number of concurrent tasks. This crate is the thin shell around it:
//!
//! * [`Document`] — the JSON payload model of the endpoint.
//! * [`Submitter`] — the transport seam; [`HttpSubmitter`] is the `reqwest`
//!   implementation, tests substitute in-process stubs.
//! * [`CrptClient`] — waits for admission, submits, and passes the outcome
//!   through unchanged. Retry policy, if any, belongs to the caller.
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use crpt_client::CrptClient;
//! use crpt_client::HttpSubmitter;
//! use slide_limit::SlidingLog;
//! use slide_limit::TimeUnit;
//!
//! # async fn example(document: crpt_client::Document) {
//! // At most five submissions per rolling second, shared by every task.
//! let limiter = Arc::new(SlidingLog::per_unit(5, TimeUnit::Second).unwrap());
//! let client = CrptClient::new(limiter, HttpSubmitter::new());
//!
//! let response = client.create_document(&document, "signature").await;
//! # let _ = response;
//! # }
//! ```

mod client;
mod document;
mod http;
mod submit;

pub use client::ClientError;
pub use client::CrptClient;
pub use document::Description;
pub use document::Document;
pub use document::Product;
pub use http::DEFAULT_ENDPOINT;
pub use http::HttpSubmitter;
pub use http::SIGNATURE_HEADER;
pub use submit::SubmitResponse;
pub use submit::Submitter;
pub use submit::TransportError;
