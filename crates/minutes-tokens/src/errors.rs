//! Token estimation error types.

use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TokenError {
    /// The model id has no known tokenizer.
    #[error("unknown model: {0}")]
    UnknownModel(String),
    /// The tokenizer for a known encoding could not be loaded.
    #[error("failed to load tokenizer {encoding}: {message}")]
    TokenizerLoad { encoding: &'static str, message: String },
}

pub type Result<T> = std::result::Result<T, TokenError>;
