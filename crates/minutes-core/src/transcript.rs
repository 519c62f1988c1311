use async_trait::async_trait;

use crate::errors::GatewayError;
use crate::ids::JobName;

/// Source of raw transcript text for a finished speech-to-text job.
///
/// Unknown jobs fail with [`GatewayError::NotFound`]; retrieval failures
/// use the retryable variants.
#[async_trait]
pub trait TranscriptSource: Send + Sync {
    fn name(&self) -> &str;

    async fn get_transcript(&self, job: &JobName) -> Result<String, GatewayError>;
}
