use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use minutes_core::errors::GatewayError;
use minutes_core::messages::ChatMessage;
use minutes_core::provider::{GenerationProvider, GenerationRequest};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Connection settings for an OpenAI-compatible chat completions endpoint.
#[derive(Clone, Debug)]
pub struct OpenAIConfig {
    pub base_url: String,
    pub api_key: Option<SecretString>,
    pub request_timeout: Duration,
}

impl Default for OpenAIConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            request_timeout: Duration::from_secs(120),
        }
    }
}

pub struct OpenAIProvider {
    client: Client,
    config: OpenAIConfig,
}

impl OpenAIProvider {
    pub fn new(config: OpenAIConfig) -> Result<Self, GatewayError> {
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| GatewayError::InvalidRequest(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client, config })
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'))
    }

    fn map_send_error(&self, e: &reqwest::Error) -> GatewayError {
        if e.is_timeout() {
            GatewayError::Timeout(self.config.request_timeout)
        } else {
            GatewayError::NetworkError(e.to_string())
        }
    }
}

// --- Wire types ---

#[derive(Serialize)]
struct ChatCompletionBody<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct Usage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

#[async_trait]
impl GenerationProvider for OpenAIProvider {
    fn name(&self) -> &str {
        "openai"
    }

    #[instrument(skip(self, request), fields(model = %request.model))]
    async fn generate(&self, request: &GenerationRequest) -> Result<String, GatewayError> {
        let body = ChatCompletionBody {
            model: &request.model,
            messages: &request.messages,
            temperature: request.options.temperature,
            max_tokens: request.options.max_tokens,
        };

        let mut req = self.client.post(self.endpoint()).json(&body);
        if let Some(key) = &self.config.api_key {
            req = req.bearer_auth(key.expose_secret());
        }

        let resp = req.send().await.map_err(|e| self.map_send_error(&e))?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let retry_after = resp
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .map(str::to_owned);
            let body = resp.text().await.unwrap_or_default();
            return Err(GatewayError::from_status_with_retry_after(
                status,
                body,
                retry_after.as_deref(),
            ));
        }

        let parsed: ChatCompletionResponse = resp
            .json()
            .await
            .map_err(|e| GatewayError::MalformedResponse(e.to_string()))?;

        if let Some(usage) = &parsed.usage {
            debug!(
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                "chat completion usage"
            );
        }

        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| GatewayError::MalformedResponse("response has no choices".into()))?;

        if choice.finish_reason.as_deref() == Some("length") {
            debug!("chat completion truncated at max_tokens");
        }

        Ok(choice.message.content.unwrap_or_default())
    }
}
