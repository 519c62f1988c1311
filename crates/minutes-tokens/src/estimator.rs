//! Token estimation seam and the `tiktoken-rs` backed implementation.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tiktoken_rs::CoreBPE;
use tracing::debug;

use crate::errors::{Result, TokenError};
use crate::models::{self, Encoding, ModelInfo};

/// Counts tokens the way a given model's tokenizer would.
///
/// One estimator instance must serve every budget decision of a pipeline
/// run, so chunk boundaries and the single-shot check agree.
pub trait TokenEstimator: Send + Sync {
    /// Number of tokens `text` costs under `model_id`'s tokenizer.
    fn estimate(&self, model_id: &str, text: &str) -> Result<usize>;

    /// Hard context limit of `model_id`, when the estimator knows it.
    fn context_window(&self, model_id: &str) -> Result<Option<usize>> {
        let _ = model_id;
        Ok(None)
    }
}

/// BPE-exact estimator for the models in [`models`].
#[derive(Default)]
pub struct TiktokenEstimator {
    encoders: RwLock<HashMap<Encoding, Arc<CoreBPE>>>,
}

impl TiktokenEstimator {
    pub fn new() -> Self {
        Self::default()
    }

    fn model(model_id: &str) -> Result<&'static ModelInfo> {
        models::find_model(model_id).ok_or_else(|| TokenError::UnknownModel(model_id.to_string()))
    }

    fn encoder(&self, encoding: Encoding) -> Result<Arc<CoreBPE>> {
        if let Some(bpe) = self.encoders.read().get(&encoding) {
            return Ok(bpe.clone());
        }

        let mut encoders = self.encoders.write();
        // Double-check after acquiring write lock
        if let Some(bpe) = encoders.get(&encoding) {
            return Ok(bpe.clone());
        }

        debug!(encoding = encoding.name(), "loading tokenizer");
        let loaded = match encoding {
            Encoding::Cl100kBase => tiktoken_rs::cl100k_base(),
            Encoding::O200kBase => tiktoken_rs::o200k_base(),
        }
        .map_err(|e| TokenError::TokenizerLoad {
            encoding: encoding.name(),
            message: e.to_string(),
        })?;

        let bpe = Arc::new(loaded);
        let _ = encoders.insert(encoding, bpe.clone());
        Ok(bpe)
    }
}

impl TokenEstimator for TiktokenEstimator {
    fn estimate(&self, model_id: &str, text: &str) -> Result<usize> {
        let model = Self::model(model_id)?;
        if text.is_empty() {
            return Ok(0);
        }
        let bpe = self.encoder(model.encoding)?;
        Ok(bpe.encode_with_special_tokens(text).len())
    }

    fn context_window(&self, model_id: &str) -> Result<Option<usize>> {
        Ok(Some(Self::model(model_id)?.context_window))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_known_text() {
        let est = TiktokenEstimator::new();
        assert_eq!(est.estimate("gpt-4", "hello world").unwrap(), 2);
        assert_eq!(est.estimate("gpt-4o", "hello world").unwrap(), 2);
    }

    #[test]
    fn empty_text_is_zero_tokens() {
        let est = TiktokenEstimator::new();
        assert_eq!(est.estimate("gpt-3.5-turbo", "").unwrap(), 0);
    }

    #[test]
    fn unknown_model_is_an_error() {
        let est = TiktokenEstimator::new();
        let err = est.estimate("claude-opus-4-6", "hello").unwrap_err();
        assert_eq!(err, TokenError::UnknownModel("claude-opus-4-6".into()));
        // Even for empty text: the model check comes first.
        assert!(est.estimate("claude-opus-4-6", "").is_err());
        assert!(est.context_window("claude-opus-4-6").is_err());
    }

    #[test]
    fn deterministic_across_calls() {
        let est = TiktokenEstimator::new();
        let text = "We agreed to ship the release on Friday. Dana owns the changelog.";
        let first = est.estimate("gpt-4o-mini", text).unwrap();
        for _ in 0..5 {
            assert_eq!(est.estimate("gpt-4o-mini", text).unwrap(), first);
        }
    }

    #[test]
    fn encoders_cached_per_encoding() {
        let est = TiktokenEstimator::new();
        let _ = est.estimate("gpt-4", "a").unwrap();
        let _ = est.estimate("gpt-3.5-turbo", "b").unwrap();
        assert_eq!(est.encoders.read().len(), 1);
        let _ = est.estimate("gpt-4o", "c").unwrap();
        assert_eq!(est.encoders.read().len(), 2);
    }

    #[test]
    fn context_window_reported() {
        let est = TiktokenEstimator::new();
        assert_eq!(est.context_window("gpt-4").unwrap(), Some(8_192));
        assert_eq!(est.context_window("gpt-4o-2024-08-06").unwrap(), Some(128_000));
    }

    #[test]
    fn longer_text_costs_more() {
        let est = TiktokenEstimator::new();
        let short = est.estimate("gpt-4o", "Minutes.").unwrap();
        let long = est
            .estimate("gpt-4o", "Minutes of the weekly planning meeting, recorded by Sam.")
            .unwrap();
        assert!(long > short);
    }
}
