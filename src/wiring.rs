//! Builds pipeline collaborators from loaded settings.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use secrecy::SecretString;

use minutes_core::provider::GenerationOptions;
use minutes_core::retry::RetryConfig;
use minutes_core::transcript::TranscriptSource;
use minutes_llm::{OpenAIConfig, OpenAIProvider, ReliableConfig, ReliableProvider};
use minutes_pipeline::{Instructions, Pipeline, PipelineConfig};
use minutes_settings::{MinutesSettings, RetrySettings, TranscriptSourceKind};
use minutes_tokens::TiktokenEstimator;
use minutes_transcript::{DirTranscriptSource, HttpTranscriptSource, ReliableSource};

const API_KEY_VARS: [&str; 2] = ["OPENAI_API_KEY", "MINUTES_API_KEY"];

/// First non-empty API key found in the environment.
pub fn api_key(lookup: impl Fn(&str) -> Option<String>) -> Option<SecretString> {
    API_KEY_VARS
        .iter()
        .filter_map(|name| lookup(name))
        .find(|v| !v.is_empty())
        .map(SecretString::from)
}

pub fn retry_config(settings: &RetrySettings) -> RetryConfig {
    RetryConfig {
        max_retries: settings.max_retries,
        base_delay: Duration::from_millis(settings.base_delay_ms),
        max_delay: Duration::from_millis(settings.max_delay_ms),
        jitter_factor: settings.jitter_factor,
    }
}

pub fn pipeline_config(settings: &MinutesSettings) -> PipelineConfig {
    PipelineConfig {
        map_concurrency: settings.pipeline.map_concurrency,
        options: GenerationOptions {
            max_tokens: settings.generation.max_output_tokens,
            temperature: settings.generation.temperature,
        },
        instructions: Instructions::with_overrides(
            settings.pipeline.primary_instructions.clone(),
            settings.pipeline.combination_instructions.clone(),
        ),
    }
}

pub fn build_source(settings: &MinutesSettings) -> Result<Arc<dyn TranscriptSource>> {
    let retry = retry_config(&settings.retry);
    let transcripts = &settings.transcripts;
    match transcripts.source {
        TranscriptSourceKind::Directory => Ok(Arc::new(ReliableSource::new(
            DirTranscriptSource::new(&transcripts.directory),
            retry,
        ))),
        TranscriptSourceKind::Http => {
            let base_url = transcripts
                .base_url
                .as_deref()
                .context("transcripts.baseUrl is required for the http source")?;
            let timeout = Duration::from_millis(settings.generation.request_timeout_ms);
            let source = HttpTranscriptSource::new(base_url, timeout)?;
            Ok(Arc::new(ReliableSource::new(source, retry)))
        }
    }
}

pub fn build_provider(
    settings: &MinutesSettings,
    api_key: Option<SecretString>,
) -> Result<ReliableProvider<OpenAIProvider>> {
    let generation = &settings.generation;
    let provider = OpenAIProvider::new(OpenAIConfig {
        base_url: generation.base_url.clone(),
        api_key,
        request_timeout: Duration::from_millis(generation.request_timeout_ms),
    })?;
    Ok(ReliableProvider::new(
        provider,
        ReliableConfig {
            retry: retry_config(&settings.retry),
            circuit_breaker_threshold: settings.retry.circuit_breaker_threshold,
            circuit_breaker_cooldown: Duration::from_millis(settings.retry.circuit_breaker_cooldown_ms),
        },
    ))
}

pub fn build_pipeline(settings: &MinutesSettings, api_key: Option<SecretString>) -> Result<Pipeline> {
    Ok(Pipeline::new(
        build_source(settings)?,
        Arc::new(TiktokenEstimator::new()),
        Arc::new(build_provider(settings, api_key)?),
        pipeline_config(settings),
    ))
}
