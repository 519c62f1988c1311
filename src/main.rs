//! # minutes
//!
//! Meeting-minutes summarizer: fetches a speech-to-text transcript and
//! condenses it with a bounded-context language model.

#![deny(unsafe_code)]

mod wiring;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use minutes_core::JobName;
use minutes_pipeline::{FinalSummary, SummaryPlan};
use minutes_settings::{load_settings, MinutesSettings};
use minutes_telemetry::{init_telemetry, LogFormat, TelemetryConfig};
use minutes_tokens::{models, TiktokenEstimator, TokenEstimator};
use minutes_transcript::job_name_for_media;

/// Summarize meeting transcripts into minutes.
#[derive(Parser, Debug)]
#[command(name = "minutes", version, about = "Summarize meeting transcripts into minutes")]
struct Cli {
    /// Log at debug level regardless of settings.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Summarize the transcript of a finished transcription job.
    Summarize {
        #[command(flatten)]
        target: JobTarget,

        #[command(flatten)]
        run: RunOptions,

        /// Directory (writes `<job>.txt`) or file to write the summary to.
        /// Defaults to stdout.
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Show how a transcript would be split, without generating anything.
    Plan {
        #[command(flatten)]
        target: JobTarget,

        #[command(flatten)]
        run: RunOptions,
    },
    /// Count the tokens of a local text file.
    Estimate {
        file: PathBuf,

        #[arg(long)]
        model: Option<String>,
    },
    /// List supported models.
    Models,
}

#[derive(clap::Args, Debug)]
struct JobTarget {
    /// Transcription job name.
    #[arg(required_unless_present = "media", conflicts_with = "media")]
    job: Option<String>,

    /// Derive the job name from the uploaded media file name instead.
    #[arg(long)]
    media: Option<String>,
}

impl JobTarget {
    fn job_name(&self) -> Result<JobName> {
        match (&self.job, &self.media) {
            (Some(job), _) => Ok(JobName::from_raw(job.as_str())),
            (None, Some(media)) => {
                let (job, format) = job_name_for_media(media)?;
                info!(media = %media, job = %job, format = %format, "derived job name from media file");
                Ok(job)
            }
            (None, None) => anyhow::bail!("either a job name or --media is required"),
        }
    }
}

#[derive(clap::Args, Debug)]
struct RunOptions {
    /// Model id (defaults to settings `generation.defaultModel`).
    #[arg(long)]
    model: Option<String>,

    /// Token budget per request (defaults to settings `pipeline.budgetTokens`).
    #[arg(long)]
    budget: Option<usize>,
}

impl RunOptions {
    fn resolve<'a>(&'a self, settings: &'a MinutesSettings) -> (&'a str, usize) {
        (
            self.model.as_deref().unwrap_or(&settings.generation.default_model),
            self.budget.unwrap_or(settings.pipeline.budget_tokens),
        )
    }
}

fn init_logging(settings: &MinutesSettings, verbose: bool) -> Result<()> {
    let format: LogFormat = settings.logging.format.parse()?;
    let level = if verbose { "debug" } else { settings.logging.level.as_str() };
    init_telemetry(&TelemetryConfig::from_level_name(level, format)?)?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = load_settings().context("failed to load settings")?;
    init_logging(&settings, cli.verbose)?;

    match cli.command {
        Command::Summarize { target, run, output } => {
            let job = target.job_name()?;
            let (model, budget) = run.resolve(&settings);
            let pipeline = wiring::build_pipeline(&settings, wiring::api_key(|name| std::env::var(name).ok()))?;
            let summary = pipeline
                .summarize(&job, budget, model)
                .await
                .with_context(|| format!("summarizing job {job}"))?;
            write_summary(&job, &summary, output.as_deref())?;
        }
        Command::Plan { target, run } => {
            let job = target.job_name()?;
            let (model, budget) = run.resolve(&settings);
            let pipeline = wiring::build_pipeline(&settings, None)?;
            let transcript = pipeline.fetch_transcript(&job).await?;
            let plan = pipeline.plan(&transcript, budget, model)?;
            print_plan(&job, model, budget, &plan);
        }
        Command::Estimate { file, model } => {
            let model = model.unwrap_or_else(|| settings.generation.default_model.clone());
            let text = std::fs::read_to_string(&file)
                .with_context(|| format!("failed to read {}", file.display()))?;
            let estimator = TiktokenEstimator::new();
            let tokens = estimator.estimate(&model, &text)?;
            match estimator.context_window(&model)? {
                Some(window) => println!("{tokens} tokens ({model}, context window {window})"),
                None => println!("{tokens} tokens ({model})"),
            }
        }
        Command::Models => {
            println!("{:<16} {:<20} {:>10} {:>8}  encoding", "id", "name", "context", "output");
            for m in models::all_models() {
                println!(
                    "{:<16} {:<20} {:>10} {:>8}  {}",
                    m.name,
                    m.display_name,
                    m.context_window,
                    m.max_output,
                    m.encoding.name()
                );
            }
        }
    }

    Ok(())
}

/// Resolve where the summary goes: `<dir>/<job>.txt`, an explicit file, or
/// `None` for stdout.
fn output_path(job: &JobName, output: Option<&Path>) -> Option<PathBuf> {
    let path = output?;
    if path.is_dir() {
        Some(path.join(format!("{job}.txt")))
    } else {
        Some(path.to_path_buf())
    }
}

fn write_summary(job: &JobName, summary: &FinalSummary, output: Option<&Path>) -> Result<()> {
    match output_path(job, output) {
        Some(path) => {
            std::fs::write(&path, &summary.text)
                .with_context(|| format!("failed to write {}", path.display()))?;
            info!(
                run_id = %summary.run_id,
                path = %path.display(),
                strategy = %summary.path,
                chunks = summary.chunk_count,
                "summary written"
            );
        }
        None => println!("{}", summary.text),
    }
    Ok(())
}

fn print_plan(job: &JobName, model: &str, budget: usize, plan: &SummaryPlan) {
    println!("job:       {job}");
    println!("model:     {model}");
    println!("budget:    {budget}");
    println!("tokens:    {}", plan.tokens());
    println!("path:      {}", plan.path());
    println!("calls:     {}", plan.generation_calls());

    if let SummaryPlan::MapReduce { chunks, .. } = plan {
        println!();
        println!("{:>5} {:>8} {:>10}  preview", "chunk", "tokens", "sentences");
        for chunk in chunks {
            println!(
                "{:>5} {:>8} {:>10}  {}",
                chunk.index,
                chunk.token_count,
                chunk.sentence_range.len(),
                preview(&chunk.text, 60)
            );
        }
    }
}

fn preview(text: &str, max_chars: usize) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(max_chars).collect();
    if chars.next().is_some() {
        format!("{head}…")
    } else {
        head
    }
}
