use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, instrument};

use minutes_core::errors::GatewayError;
use minutes_core::ids::JobName;
use minutes_core::transcript::TranscriptSource;

use crate::job::check_job_name;
use crate::transcribe::parse_transcribe_output;

/// Fetches Transcribe output documents from `GET {base_url}/{job}.json`.
pub struct HttpTranscriptSource {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl HttpTranscriptSource {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, GatewayError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GatewayError::InvalidRequest(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: base_url.into(),
            timeout,
        })
    }

    fn document_url(&self, job: &JobName) -> String {
        format!("{}/{}.json", self.base_url.trim_end_matches('/'), job)
    }
}

#[async_trait]
impl TranscriptSource for HttpTranscriptSource {
    fn name(&self) -> &str {
        "http"
    }

    #[instrument(skip(self), fields(job = %job))]
    async fn get_transcript(&self, job: &JobName) -> Result<String, GatewayError> {
        check_job_name(job)?;
        let url = self.document_url(job);
        let resp = self.client.get(&url).send().await.map_err(|e| {
            if e.is_timeout() {
                GatewayError::Timeout(self.timeout)
            } else {
                GatewayError::NetworkError(e.to_string())
            }
        })?;

        let status = resp.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(GatewayError::NotFound(format!("transcript for job {job}")));
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(GatewayError::from_status(status.as_u16(), body));
        }

        let body = resp
            .bytes()
            .await
            .map_err(|e| GatewayError::NetworkError(e.to_string()))?;
        debug!(bytes = body.len(), "transcript document fetched");
        parse_transcribe_output(&body)
    }
}
