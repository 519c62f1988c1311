use async_trait::async_trait;
use tracing::warn;

use minutes_core::errors::GatewayError;
use minutes_core::ids::JobName;
use minutes_core::retry::{with_retries, RetryConfig};
use minutes_core::transcript::TranscriptSource;

/// Retries transient transcript retrieval failures.
///
/// `NotFound` and other fatal errors are returned on the first attempt.
pub struct ReliableSource<S: TranscriptSource> {
    inner: S,
    retry: RetryConfig,
}

impl<S: TranscriptSource> ReliableSource<S> {
    pub fn new(inner: S, retry: RetryConfig) -> Self {
        Self { inner, retry }
    }
}

#[async_trait]
impl<S: TranscriptSource> TranscriptSource for ReliableSource<S> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn get_transcript(&self, job: &JobName) -> Result<String, GatewayError> {
        let outcome = with_retries(&self.retry, "get_transcript", || self.inner.get_transcript(job)).await;
        if outcome.retries > 0 {
            if let Err(e) = &outcome.result {
                warn!(job = %job, retries = outcome.retries, error_kind = e.error_kind(), "transcript retrieval gave up");
            }
        }
        outcome.result
    }
}
