//! Transcript retrieval for finished speech-to-text jobs.
//!
//! Every source implements [`minutes_core::TranscriptSource`]; the pipeline
//! only ever sees the trait object.

pub mod dir;
pub mod http;
pub mod job;
pub mod reliable;
pub mod transcribe;

pub use dir::DirTranscriptSource;
pub use http::HttpTranscriptSource;
pub use job::{check_job_name, job_name_for_media, JobNameError, MediaFormat};
pub use reliable::ReliableSource;
pub use transcribe::parse_transcribe_output;
