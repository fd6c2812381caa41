//! reqwest-backed [`Submitter`] for the CRPT endpoint.

use std::collections::HashMap;

use async_trait::async_trait;
use tracing::warn;

use crate::submit::SubmitResponse;
use crate::submit::Submitter;
use crate::submit::TransportError;

/// The production document-creation endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://ismp.crpt.ru/api/v3/lk/documents/create";

/// Header carrying the caller's detached signature.
pub const SIGNATURE_HEADER: &str = "Signature";

/// Submits documents over HTTPS.
///
/// The submitter owns its connection pool; the throttle in front of it never
/// manages transport state.
#[derive(Debug, Clone)]
pub struct HttpSubmitter {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpSubmitter {
    /// Creates a submitter pointed at [`DEFAULT_ENDPOINT`].
    pub fn new() -> Self {
        Self::with_endpoint(DEFAULT_ENDPOINT)
    }

    /// Creates a submitter for a custom endpoint, e.g. a sandbox environment.
    pub fn with_endpoint(endpoint: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
        }
    }

    /// Uses a pre-configured `reqwest` client (custom TLS, proxies, timeouts).
    pub fn with_client(client: reqwest::Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }
}

impl Default for HttpSubmitter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Submitter for HttpSubmitter {
    async fn submit(
        &self,
        payload: &[u8],
        metadata: &HashMap<String, String>,
    ) -> Result<SubmitResponse, TransportError> {
        let mut request = self
            .client
            .post(&self.endpoint)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(payload.to_vec());
        for (name, value) in metadata {
            request = request.header(name.as_str(), value.as_str());
        }

        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if status.is_success() {
            Ok(SubmitResponse {
                status: status.as_u16(),
                body,
            })
        } else {
            warn!(code = status.as_u16(), "submission rejected by endpoint");
            Err(TransportError::Status {
                code: status.as_u16(),
                body,
            })
        }
    }
}
