//! Settings type definitions.
//!
//! All types use camelCase JSON field names and `#[serde(default)]`, so a
//! partial settings file only needs the fields it changes.

use serde::{Deserialize, Serialize};

use crate::errors::{Result, SettingsError};

/// Root settings type.
///
/// ```json
/// {
///   "generation": { "defaultModel": "gpt-4o" },
///   "pipeline": { "budgetTokens": 6000 }
/// }
/// ```
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MinutesSettings {
    /// Text-generation endpoint and request defaults.
    pub generation: GenerationSettings,
    /// Chunking and map/reduce behavior.
    pub pipeline: PipelineSettings,
    /// Retry and circuit breaker policy for external calls.
    pub retry: RetrySettings,
    /// Where transcripts are read from.
    pub transcripts: TranscriptSettings,
    /// Logging configuration.
    pub logging: LoggingSettings,
}

impl MinutesSettings {
    pub fn validate(&self) -> Result<()> {
        self.pipeline.validate()?;
        self.retry.validate()
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GenerationSettings {
    /// Base URL of an OpenAI-compatible API (no trailing `/chat/completions`).
    pub base_url: String,
    pub default_model: String,
    pub temperature: Option<f64>,
    /// Cap on reply tokens per generation call.
    pub max_output_tokens: Option<u32>,
    pub request_timeout_ms: u64,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            default_model: "gpt-4o-mini".to_string(),
            temperature: Some(0.2),
            max_output_tokens: Some(2_048),
            request_timeout_ms: 120_000,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PipelineSettings {
    /// Token budget shared by the single-shot check and chunk boundaries.
    pub budget_tokens: usize,
    /// Maximum chunk summaries in flight at once.
    pub map_concurrency: usize,
    /// Replaces the built-in per-chunk instructions.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary_instructions: Option<String>,
    /// Replaces the built-in instructions for merging partial summaries.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub combination_instructions: Option<String>,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            budget_tokens: 12_000,
            map_concurrency: 4,
            primary_instructions: None,
            combination_instructions: None,
        }
    }
}

impl PipelineSettings {
    pub fn validate(&self) -> Result<()> {
        if self.budget_tokens == 0 {
            return Err(SettingsError::InvalidValue(
                "pipeline.budgetTokens must be positive".into(),
            ));
        }
        if self.map_concurrency == 0 {
            return Err(SettingsError::InvalidValue(
                "pipeline.mapConcurrency must be positive".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RetrySettings {
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
    pub jitter_factor: f64,
    /// Consecutive failed requests before generation calls are short-circuited.
    pub circuit_breaker_threshold: u32,
    pub circuit_breaker_cooldown_ms: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 1_000,
            max_delay_ms: 30_000,
            jitter_factor: 0.2,
            circuit_breaker_threshold: 5,
            circuit_breaker_cooldown_ms: 60_000,
        }
    }
}

impl RetrySettings {
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.jitter_factor) {
            return Err(SettingsError::InvalidValue(format!(
                "retry.jitterFactor must be within 0..=1, got {}",
                self.jitter_factor
            )));
        }
        if self.base_delay_ms > self.max_delay_ms {
            return Err(SettingsError::InvalidValue(
                "retry.baseDelayMs must not exceed retry.maxDelayMs".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TranscriptSourceKind {
    /// `<directory>/<job>.json` or `<directory>/<job>.txt`.
    #[default]
    Directory,
    /// `GET <baseUrl>/<job>.json`.
    Http,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TranscriptSettings {
    pub source: TranscriptSourceKind,
    pub directory: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

impl Default for TranscriptSettings {
    fn default() -> Self {
        let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
        Self {
            source: TranscriptSourceKind::Directory,
            directory: format!("{home}/.minutes/transcripts"),
            base_url: None,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggingSettings {
    pub level: String,
    /// `pretty` or `json`.
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}
