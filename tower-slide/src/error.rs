/// Errors produced by the admission middleware.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SlideError {
    /// The request exceeded the configured deadline, either while queued for
    /// admission or while the inner service was executing it.
    #[error("request timed out waiting for admission capacity")]
    Timeout,

    /// The request was rejected because the window is saturated and the
    /// service is configured to fail fast.
    ///
    /// The duration indicates when the client should retry.
    #[error("admission limit exceeded; retry after {retry_after:?}")]
    RateLimited {
        /// The duration to wait before retrying.
        retry_after: std::time::Duration,
    },

    /// The limiter was shut down while this request waited for admission.
    #[error("limiter shut down while request waited for admission")]
    Cancelled,
}
