//! Pipeline orchestration: estimate, pick a path, map, reduce.
//!
//! ```text
//! START → ESTIMATE ─┬─ t < budget ─► SINGLE_SHOT ──────────► DONE
//!                   └─ t ≥ budget ─► MAP (bounded fan-out) ► REDUCE ► DONE
//! ```
//!
//! Every stage consumes its input fully before the next one starts, and
//! nothing survives the run.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use futures::{stream, StreamExt, TryStreamExt};
use serde::Serialize;
use tracing::{debug, info, info_span, warn, Instrument};

use minutes_core::ids::{JobName, RunId};
use minutes_core::provider::{GenerationOptions, GenerationProvider};
use minutes_core::transcript::TranscriptSource;
use minutes_tokens::TokenEstimator;

use crate::chunker::{build_chunks, Chunk};
use crate::error::{PipelineError, Result};
use crate::invoker::SummarizerInvoker;
use crate::prompts::{join_partials, Instructions};
use crate::segmenter::segment;

/// Per-pipeline settings that do not change between runs.
#[derive(Clone, Debug)]
pub struct PipelineConfig {
    /// Maximum chunk summaries in flight at once during MAP.
    pub map_concurrency: usize,
    pub options: GenerationOptions,
    pub instructions: Instructions,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            map_concurrency: 4,
            options: GenerationOptions::default(),
            instructions: Instructions::default(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SummaryPath {
    SingleShot,
    MapReduce,
}

impl fmt::Display for SummaryPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::SingleShot => "single-shot",
            Self::MapReduce => "map-reduce",
        })
    }
}

/// What a run will do, decided before any generation call.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "path", rename_all = "snake_case")]
pub enum SummaryPlan {
    SingleShot { tokens: usize },
    MapReduce { tokens: usize, chunks: Vec<Chunk> },
}

impl SummaryPlan {
    /// Token count of the whole transcript.
    pub fn tokens(&self) -> usize {
        match self {
            Self::SingleShot { tokens } | Self::MapReduce { tokens, .. } => *tokens,
        }
    }

    pub fn path(&self) -> SummaryPath {
        match self {
            Self::SingleShot { .. } => SummaryPath::SingleShot,
            Self::MapReduce { .. } => SummaryPath::MapReduce,
        }
    }

    pub fn chunk_count(&self) -> usize {
        match self {
            Self::SingleShot { .. } => 1,
            Self::MapReduce { chunks, .. } => chunks.len(),
        }
    }

    /// Number of generation calls executing this plan makes.
    pub fn generation_calls(&self) -> usize {
        match self {
            Self::SingleShot { .. } => 1,
            Self::MapReduce { chunks, .. } => chunks.len() + 1,
        }
    }
}

/// Result of a successful run.
#[derive(Clone, Debug)]
pub struct FinalSummary {
    pub run_id: RunId,
    pub text: String,
    pub path: SummaryPath,
    pub transcript_tokens: usize,
    pub chunk_count: usize,
}

/// Summarizes transcripts of any length with a bounded-context model.
///
/// All collaborators are injected, so the same pipeline runs against real
/// services or test doubles.
pub struct Pipeline {
    source: Arc<dyn TranscriptSource>,
    estimator: Arc<dyn TokenEstimator>,
    provider: Arc<dyn GenerationProvider>,
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(
        source: Arc<dyn TranscriptSource>,
        estimator: Arc<dyn TokenEstimator>,
        provider: Arc<dyn GenerationProvider>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            source,
            estimator,
            provider,
            config,
        }
    }

    pub async fn fetch_transcript(&self, job: &JobName) -> Result<String> {
        let transcript = self.source.get_transcript(job).await?;
        debug!(source = self.source.name(), chars = transcript.len(), "transcript retrieved");
        Ok(transcript)
    }

    fn validate(&self, budget: usize, model: &str) -> Result<()> {
        if budget == 0 {
            return Err(PipelineError::Configuration("budget must be positive".into()));
        }
        if let Some(window) = self.estimator.context_window(model)? {
            if budget >= window {
                return Err(PipelineError::Configuration(format!(
                    "budget {budget} leaves no room in the {window}-token context of {model}"
                )));
            }
        }
        Ok(())
    }

    /// Decide the path for `transcript` and, for map-reduce, its chunks.
    /// Makes no generation calls.
    pub fn plan(&self, transcript: &str, budget: usize, model: &str) -> Result<SummaryPlan> {
        self.validate(budget, model)?;

        let tokens = self.estimator.estimate(model, transcript)?;
        if tokens < budget {
            return Ok(SummaryPlan::SingleShot { tokens });
        }

        let sentences = segment(transcript);
        if sentences.is_empty() {
            // Whitespace-only input has nothing to chunk.
            return Ok(SummaryPlan::SingleShot { tokens });
        }
        let chunks = build_chunks(&sentences, budget, model, self.estimator.as_ref())?;
        Ok(SummaryPlan::MapReduce { tokens, chunks })
    }

    /// Retrieve the transcript of `job` and summarize it.
    pub async fn summarize(&self, job: &JobName, budget: usize, model: &str) -> Result<FinalSummary> {
        let run_id = RunId::new();
        let span = info_span!("summarize", run_id = %run_id, job = %job, model, budget);
        async {
            let transcript = self.fetch_transcript(job).await?;
            self.run(run_id, &transcript, budget, model).await
        }
        .instrument(span)
        .await
    }

    /// Summarize transcript text that is already in hand.
    pub async fn summarize_text(&self, transcript: &str, budget: usize, model: &str) -> Result<FinalSummary> {
        let run_id = RunId::new();
        let span = info_span!("summarize", run_id = %run_id, model, budget);
        self.run(run_id, transcript, budget, model).instrument(span).await
    }

    async fn run(&self, run_id: RunId, transcript: &str, budget: usize, model: &str) -> Result<FinalSummary> {
        let started = Instant::now();
        let plan = self.plan(transcript, budget, model)?;
        info!(
            path = %plan.path(),
            tokens = plan.tokens(),
            chunks = plan.chunk_count(),
            "summary planned"
        );

        let invoker = SummarizerInvoker::new(self.provider.clone(), model, self.config.options.clone());
        let result = match &plan {
            SummaryPlan::SingleShot { .. } => invoker.invoke(&self.config.instructions.primary, transcript).await,
            SummaryPlan::MapReduce { chunks, .. } => self.map_reduce(&invoker, chunks).await,
        };

        match result {
            Ok(text) => {
                info!(
                    path = %plan.path(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "summary complete"
                );
                Ok(FinalSummary {
                    run_id,
                    text,
                    path: plan.path(),
                    transcript_tokens: plan.tokens(),
                    chunk_count: plan.chunk_count(),
                })
            }
            Err(e) => {
                warn!(error_kind = e.kind(), error = %e, "summary failed");
                Err(e)
            }
        }
    }

    async fn map_reduce(&self, invoker: &SummarizerInvoker, chunks: &[Chunk]) -> Result<String> {
        let partials = self.map(invoker, chunks).await?;
        let joined = join_partials(&partials);
        debug!(partials = partials.len(), chars = joined.len(), "reducing partial summaries");
        invoker.invoke(&self.config.instructions.combination, &joined).await
    }

    /// Summarize every chunk with at most `map_concurrency` calls in flight.
    /// Partials come back in chunk order; the first failure aborts the rest.
    async fn map(&self, invoker: &SummarizerInvoker, chunks: &[Chunk]) -> Result<Vec<String>> {
        let primary = self.config.instructions.primary.as_str();
        stream::iter(chunks.iter().map(|chunk| async move {
            debug!(chunk = chunk.index, tokens = chunk.token_count, "summarizing chunk");
            invoker.invoke(primary, &chunk.text).await
        }))
        .buffered(self.config.map_concurrency.max(1))
        .try_collect()
        .await
    }
}
