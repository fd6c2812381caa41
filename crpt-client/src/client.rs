use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;
use tracing::info;

use slide_limit::AcquireError;
use slide_limit::SlidingLog;

use crate::document::Document;
use crate::http::SIGNATURE_HEADER;
use crate::submit::SubmitResponse;
use crate::submit::Submitter;
use crate::submit::TransportError;

/// Errors surfaced by [`CrptClient`].
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The limiter was shut down while this call waited for admission.
    #[error("cancelled while waiting for admission")]
    Cancelled,

    /// The document could not be encoded as JSON.
    #[error("failed to encode document: {0}")]
    Encode(#[from] serde_json::Error),

    /// The transport failed; passed through from the submitter untouched.
    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl From<AcquireError> for ClientError {
    fn from(_: AcquireError) -> Self {
        ClientError::Cancelled
    }
}

/// A throttled document-creation client.
///
/// Every call waits for admission from the shared [`SlidingLog`] before the
/// submitter is invoked, so no more than `limit` submissions start inside any
/// rolling window no matter how many tasks call concurrently. The client adds
/// nothing else: no buffering, no retries, and the submitter's outcome is
/// returned unchanged.
#[derive(Debug)]
pub struct CrptClient<S> {
    limiter: Arc<SlidingLog>,
    submitter: S,
}

impl<S: Submitter> CrptClient<S> {
    pub fn new(limiter: Arc<SlidingLog>, submitter: S) -> Self {
        Self { limiter, submitter }
    }

    /// The limiter admissions are drawn from; sharable with other clients.
    pub fn limiter(&self) -> &Arc<SlidingLog> {
        &self.limiter
    }

    /// Encodes `document`, waits for admission, and submits it with the
    /// detached `signature` attached as a header.
    pub async fn create_document(
        &self,
        document: &Document,
        signature: &str,
    ) -> Result<SubmitResponse, ClientError> {
        let payload = serde_json::to_vec(document)?;
        let metadata = HashMap::from([(SIGNATURE_HEADER.to_string(), signature.to_string())]);
        self.run(&payload, &metadata).await
    }

    /// Byte-level variant of [`create_document`](CrptClient::create_document)
    /// for payloads encoded elsewhere.
    pub async fn run(
        &self,
        payload: &[u8],
        metadata: &HashMap<String, String>,
    ) -> Result<SubmitResponse, ClientError> {
        debug!("waiting for admission");
        self.limiter.acquire().await?;

        info!(bytes = payload.len(), "submitting document");
        Ok(self.submitter.submit(payload, metadata).await?)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;
    use std::sync::atomic::Ordering;
    use std::time::Duration;
    use std::time::Instant;

    use async_trait::async_trait;
    use more_asserts::assert_ge;

    use super::*;

    struct StubSubmitter {
        response: SubmitResponse,
        count: AtomicUsize,
    }

    impl StubSubmitter {
        fn ok() -> Self {
            Self {
                response: SubmitResponse {
                    status: 200,
                    body: "{\"value\":\"accepted\"}".to_string(),
                },
                count: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl Submitter for StubSubmitter {
        async fn submit(
            &self,
            _payload: &[u8],
            _metadata: &HashMap<String, String>,
        ) -> Result<SubmitResponse, TransportError> {
            self.count.fetch_add(1, Ordering::SeqCst);
            Ok(self.response.clone())
        }
    }

    struct RejectingSubmitter;

    #[async_trait]
    impl Submitter for RejectingSubmitter {
        async fn submit(
            &self,
            _payload: &[u8],
            _metadata: &HashMap<String, String>,
        ) -> Result<SubmitResponse, TransportError> {
            Err(TransportError::Status {
                code: 503,
                body: String::new(),
            })
        }
    }

    fn sample_document() -> Document {
        use crate::document::Description;

        Document {
            description: Description {
                participant_inn: "7700000000".to_string(),
            },
            doc_id: "doc-1".to_string(),
            doc_status: "DRAFT".to_string(),
            doc_type: "LP_INTRODUCE_GOODS".to_string(),
            import_request: true,
            owner_inn: "7700000000".to_string(),
            participant_inn: "7700000000".to_string(),
            producer_inn: "7700000000".to_string(),
            production_date: "2020-01-23".to_string(),
            production_type: "OWN_PRODUCTION".to_string(),
            products: vec![],
            reg_date: "2020-01-23".to_string(),
            reg_number: "reg-1".to_string(),
        }
    }

    #[tokio::test]
    async fn it_passes_the_response_through_unchanged() {
        let limiter = Arc::new(SlidingLog::new(10, Duration::from_secs(1)).unwrap());
        let client = CrptClient::new(limiter, StubSubmitter::ok());

        let response = client
            .create_document(&sample_document(), "signature")
            .await
            .unwrap();

        assert_eq!(response.status, 200);
        assert_eq!(response.body, "{\"value\":\"accepted\"}");
        assert_eq!(client.submitter.count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn it_passes_transport_errors_through_unchanged() {
        let limiter = Arc::new(SlidingLog::new(10, Duration::from_secs(1)).unwrap());
        let client = CrptClient::new(limiter, RejectingSubmitter);

        let err = client
            .create_document(&sample_document(), "signature")
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ClientError::Transport(TransportError::Status { code: 503, .. })
        ));
    }

    #[tokio::test]
    async fn shutdown_surfaces_as_cancelled() {
        let limiter = Arc::new(SlidingLog::new(1, Duration::from_secs(60)).unwrap());
        let client = CrptClient::new(Arc::clone(&limiter), StubSubmitter::ok());

        // Fill the only slot, then shut down while a call would have to wait.
        limiter.acquire().await.unwrap();
        limiter.shutdown();

        let err = client
            .create_document(&sample_document(), "signature")
            .await
            .unwrap_err();

        assert!(matches!(err, ClientError::Cancelled));
        // No submission happened for the cancelled call.
        assert_eq!(client.submitter.count.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_calls_are_throttled() {
        let window = Duration::from_millis(100);
        let limiter = Arc::new(SlidingLog::new(2, window).unwrap());
        let client = Arc::new(CrptClient::new(limiter, StubSubmitter::ok()));

        let start = Instant::now();
        let mut handles = vec![];
        for _ in 0..6 {
            let client = Arc::clone(&client);
            handles.push(tokio::spawn(async move {
                client.create_document(&sample_document(), "sig").await
            }));
        }
        for h in handles {
            h.await.unwrap().unwrap();
        }

        // Six calls at two per window need at least two extra windows.
        assert_ge!(start.elapsed(), window * 2 - Duration::from_millis(20));
        assert_eq!(client.submitter.count.load(Ordering::SeqCst), 6);
    }
}
