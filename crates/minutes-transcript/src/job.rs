use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

use minutes_core::errors::GatewayError;
use minutes_core::ids::JobName;

const JOB_PREFIX: &str = "transcribe-job-";

static DISALLOWED: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^a-zA-Z0-9_\-]").unwrap());

/// Transcribe job-name charset and length limit.
static VALID_JOB_NAME: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[0-9a-zA-Z._-]{1,200}$").unwrap());

/// Media container reported to the speech-to-text service.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MediaFormat {
    Mp3,
    /// `.m4a` uploads are submitted as MP4 audio.
    Mp4,
}

impl MediaFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mp3 => "mp3",
            Self::Mp4 => "mp4",
        }
    }
}

impl fmt::Display for MediaFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum JobNameError {
    #[error("unsupported media format: {0} (expected .mp3 or .m4a)")]
    UnsupportedFormat(String),
}

/// Derive the transcription job name and media format for an uploaded file.
///
/// `"Team Sync 03.mp3"` becomes `transcribe-job-team-sync-03-mp3`.
pub fn job_name_for_media(file_name: &str) -> Result<(JobName, MediaFormat), JobNameError> {
    let format = if file_name.ends_with("mp3") {
        MediaFormat::Mp3
    } else if file_name.ends_with("m4a") {
        MediaFormat::Mp4
    } else {
        return Err(JobNameError::UnsupportedFormat(file_name.to_string()));
    };

    let dashed = file_name.replace([' ', '.'], "-");
    let key = DISALLOWED.replace_all(&dashed, "").to_lowercase();
    Ok((JobName::from_raw(format!("{JOB_PREFIX}{key}")), format))
}

/// Reject job names a source could not use as a single file name or URL
/// path segment.
pub fn check_job_name(job: &JobName) -> Result<(), GatewayError> {
    let name = job.as_str();
    if !VALID_JOB_NAME.is_match(name) || name.starts_with('.') {
        return Err(GatewayError::InvalidRequest(format!("invalid job name: {name:?}")));
    }
    Ok(())
}
