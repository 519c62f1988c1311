use minutes_core::errors::GatewayError;
use minutes_tokens::TokenError;

/// Why a summarization run failed. A run either produces a complete
/// summary or one of these; there is no partial result.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Unknown model or tokenizer, invalid budget.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Retrieval or generation failed after the retry policy gave up.
    #[error("transport error: {0}")]
    Transport(#[source] GatewayError),

    /// The generation capability answered with no usable content.
    #[error("generation error: {0}")]
    Generation(String),

    #[error("not found: {0}")]
    NotFound(String),
}

impl PipelineError {
    /// Short classification string for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "configuration",
            Self::Transport(_) => "transport",
            Self::Generation(_) => "generation",
            Self::NotFound(_) => "not_found",
        }
    }
}

impl From<GatewayError> for PipelineError {
    fn from(e: GatewayError) -> Self {
        match e {
            GatewayError::NotFound(what) => Self::NotFound(what),
            other => Self::Transport(other),
        }
    }
}

impl From<TokenError> for PipelineError {
    fn from(e: TokenError) -> Self {
        Self::Configuration(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
