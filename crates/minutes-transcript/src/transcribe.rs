//! AWS Transcribe output documents.
//!
//! A finished job's output file looks like:
//!
//! ```json
//! {
//!   "jobName": "transcribe-job-standup-mp3",
//!   "results": {
//!     "transcripts": [{ "transcript": "Good morning everyone. ..." }],
//!     "items": [ ... ]
//!   },
//!   "status": "COMPLETED"
//! }
//! ```
//!
//! Only the first entry of `results.transcripts` is used.

use serde::Deserialize;

use minutes_core::errors::GatewayError;

#[derive(Deserialize)]
struct TranscribeOutput {
    results: TranscribeResults,
}

#[derive(Deserialize)]
struct TranscribeResults {
    #[serde(default)]
    transcripts: Vec<TranscriptEntry>,
}

#[derive(Deserialize)]
struct TranscriptEntry {
    transcript: String,
}

/// Extract the transcript text from a Transcribe output document.
pub fn parse_transcribe_output(body: &[u8]) -> Result<String, GatewayError> {
    let output: TranscribeOutput = serde_json::from_slice(body)
        .map_err(|e| GatewayError::MalformedResponse(format!("transcript document: {e}")))?;

    output
        .results
        .transcripts
        .into_iter()
        .next()
        .map(|entry| entry.transcript)
        .ok_or_else(|| GatewayError::MalformedResponse("transcript document has no transcripts".into()))
}
