use std::collections::HashMap;

use async_trait::async_trait;

/// A successful submission outcome: the endpoint's status code and body,
/// returned to the caller uninterpreted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitResponse {
    pub status: u16,
    pub body: String,
}

/// Errors raised by the transport collaborator.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The endpoint answered with a non-success status.
    #[error("endpoint returned status {code}")]
    Status { code: u16, body: String },

    /// The request never completed.
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
}

/// The external collaborator that moves bytes to the endpoint.
///
/// The throttled client never constructs HTTP primitives itself; anything
/// that can POST a payload with a set of headers can stand behind this trait,
/// including in-process stubs in tests.
#[async_trait]
pub trait Submitter: Send + Sync {
    /// Performs the network POST of `payload`, attaching each `metadata`
    /// entry as a request header.
    async fn submit(
        &self,
        payload: &[u8],
        metadata: &HashMap<String, String>,
    ) -> Result<SubmitResponse, TransportError>;
}
