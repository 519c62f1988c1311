//! # minutes-tokens
//!
//! Token counting for the models the summarization pipeline can target.
//!
//! [`models`] lists the supported model ids with their context windows and
//! tokenizer encodings. Budget decisions go through [`TokenEstimator`];
//! [`TiktokenEstimator`] implements it with `tiktoken-rs`, caching one
//! encoder per encoding.
//!
//! Unknown model ids are an error, not a fallback to some default encoding.

pub mod errors;
pub mod estimator;
pub mod models;

pub use errors::{Result, TokenError};
pub use estimator::{TiktokenEstimator, TokenEstimator};
pub use models::{find_model, Encoding, ModelInfo};
