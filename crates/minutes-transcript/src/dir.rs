use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;

use minutes_core::errors::GatewayError;
use minutes_core::ids::JobName;
use minutes_core::transcript::TranscriptSource;

use crate::job::check_job_name;
use crate::transcribe::parse_transcribe_output;

/// Reads transcripts that were downloaded to a local directory.
///
/// `{dir}/{job}.json` is parsed as a Transcribe output document; otherwise
/// `{dir}/{job}.txt` is returned as-is.
pub struct DirTranscriptSource {
    dir: PathBuf,
}

impl DirTranscriptSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

async fn read_if_present(path: &Path) -> Result<Option<Vec<u8>>, GatewayError> {
    match tokio::fs::read(path).await {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(GatewayError::NetworkError(format!(
            "reading {}: {e}",
            path.display()
        ))),
    }
}

#[async_trait]
impl TranscriptSource for DirTranscriptSource {
    fn name(&self) -> &str {
        "directory"
    }

    async fn get_transcript(&self, job: &JobName) -> Result<String, GatewayError> {
        check_job_name(job)?;
        let name = job.as_str();

        let json_path = self.dir.join(format!("{name}.json"));
        if let Some(bytes) = read_if_present(&json_path).await? {
            debug!(path = %json_path.display(), "reading transcript document");
            return parse_transcribe_output(&bytes);
        }

        let text_path = self.dir.join(format!("{name}.txt"));
        if let Some(bytes) = read_if_present(&text_path).await? {
            debug!(path = %text_path.display(), "reading plain transcript");
            return String::from_utf8(bytes).map_err(|e| {
                GatewayError::MalformedResponse(format!("{} is not UTF-8: {e}", text_path.display()))
            });
        }

        Err(GatewayError::NotFound(format!(
            "transcript for job {job} in {}",
            self.dir.display()
        )))
    }
}
