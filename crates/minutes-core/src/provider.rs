use async_trait::async_trait;

use crate::errors::GatewayError;
use crate::messages::ChatMessage;

/// Options controlling generation behavior.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GenerationOptions {
    pub max_tokens: Option<u32>,
    pub temperature: Option<f64>,
}

/// A single request to a text-generation capability.
#[derive(Clone, Debug, PartialEq)]
pub struct GenerationRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub options: GenerationOptions,
}

impl GenerationRequest {
    pub fn new(model: impl Into<String>, messages: Vec<ChatMessage>) -> Self {
        Self {
            model: model.into(),
            messages,
            options: GenerationOptions::default(),
        }
    }

    pub fn with_options(mut self, options: GenerationOptions) -> Self {
        self.options = options;
        self
    }
}

/// Trait implemented by each text-generation backend.
///
/// Returns the primary generated text. An empty string is a valid return
/// value here; callers decide whether that is usable.
#[async_trait]
pub trait GenerationProvider: Send + Sync {
    fn name(&self) -> &str;

    async fn generate(&self, request: &GenerationRequest) -> Result<String, GatewayError>;
}
