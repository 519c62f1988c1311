use std::sync::Arc;

use tracing::debug;

use minutes_core::messages::ChatMessage;
use minutes_core::provider::{GenerationOptions, GenerationProvider, GenerationRequest};

use crate::error::{PipelineError, Result};

/// One summarization call: instructions as the `system` turn, content as
/// the `user` turn. Retrying is the provider's concern.
#[derive(Clone)]
pub struct SummarizerInvoker {
    provider: Arc<dyn GenerationProvider>,
    model: String,
    options: GenerationOptions,
}

impl SummarizerInvoker {
    pub fn new(provider: Arc<dyn GenerationProvider>, model: impl Into<String>, options: GenerationOptions) -> Self {
        Self {
            provider,
            model: model.into(),
            options,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub async fn invoke(&self, instructions: &str, content: &str) -> Result<String> {
        let request = GenerationRequest::new(
            self.model.as_str(),
            vec![ChatMessage::system(instructions), ChatMessage::user(content)],
        )
        .with_options(self.options.clone());

        let text = self.provider.generate(&request).await?;
        if text.trim().is_empty() {
            return Err(PipelineError::Generation(format!(
                "{} returned no content for model {}",
                self.provider.name(),
                self.model
            )));
        }
        debug!(provider = self.provider.name(), chars = text.len(), "generation complete");
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use minutes_core::errors::GatewayError;
    use minutes_core::messages::Role;
    use minutes_llm::{MockProvider, MockResponse};

    fn invoker(mock: &Arc<MockProvider>) -> SummarizerInvoker {
        SummarizerInvoker::new(
            mock.clone(),
            "gpt-4o-mini",
            GenerationOptions {
                max_tokens: Some(512),
                temperature: Some(0.2),
            },
        )
    }

    #[tokio::test]
    async fn sends_exactly_system_then_user() {
        let mock = Arc::new(MockProvider::new(vec![MockResponse::text("minutes")]));
        let text = invoker(&mock).invoke("Summarize.", "  raw transcript  ").await.unwrap();
        assert_eq!(text, "minutes");

        let requests = mock.requests();
        assert_eq!(requests.len(), 1);
        let req = &requests[0];
        assert_eq!(req.model, "gpt-4o-mini");
        assert_eq!(req.options.max_tokens, Some(512));
        assert_eq!(req.messages.len(), 2);
        assert_eq!(req.messages[0].role, Role::System);
        assert_eq!(req.messages[0].content, "Summarize.");
        assert_eq!(req.messages[1].role, Role::User);
        assert_eq!(req.messages[1].content, "  raw transcript  ");
    }

    #[tokio::test]
    async fn blank_output_is_generation_error() {
        let mock = Arc::new(MockProvider::new(vec![MockResponse::text(" \n ")]));
        let err = invoker(&mock).invoke("i", "c").await.unwrap_err();
        assert!(matches!(err, PipelineError::Generation(_)));
    }

    #[tokio::test]
    async fn provider_failure_is_transport() {
        let mock = Arc::new(MockProvider::new(vec![MockResponse::Error(GatewayError::Timeout(
            std::time::Duration::from_secs(120),
        ))]));
        let err = invoker(&mock).invoke("i", "c").await.unwrap_err();
        assert!(matches!(err, PipelineError::Transport(GatewayError::Timeout(_))));
        assert_eq!(mock.call_count(), 1);
    }
}
