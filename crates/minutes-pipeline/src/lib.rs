//! # minutes-pipeline
//!
//! Turns a transcript of any length into one summary while keeping every
//! generation request under a token budget.
//!
//! ```text
//! transcript ──estimate──┬── < budget ──► single call ─────────────────────► summary
//!                        └── ≥ budget ──► segment ► chunk ► map (N calls) ► reduce ► summary
//! ```
//!
//! - [`segmenter`]: sentence splitting with whitespace normalization
//! - [`chunker`]: greedy bin-packing of sentences under the budget
//! - [`invoker`]: one `[system, user]` generation call
//! - [`orchestrator`]: path decision, concurrent map, ordered reduce

pub mod chunker;
pub mod error;
pub mod invoker;
pub mod orchestrator;
pub mod prompts;
pub mod segmenter;

pub use chunker::{build_chunks, Chunk};
pub use error::{PipelineError, Result};
pub use invoker::SummarizerInvoker;
pub use orchestrator::{FinalSummary, Pipeline, PipelineConfig, SummaryPath, SummaryPlan};
pub use prompts::{Instructions, PARTIAL_SEPARATOR};
pub use segmenter::segment;
