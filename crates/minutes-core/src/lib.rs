pub mod errors;
pub mod ids;
pub mod messages;
pub mod provider;
pub mod retry;
pub mod transcript;

pub use errors::{ErrorClass, GatewayError};
pub use ids::{JobName, RunId};
pub use messages::{ChatMessage, Role};
pub use provider::{GenerationOptions, GenerationProvider, GenerationRequest};
pub use retry::{with_retries, RetryConfig, RetryOutcome};
pub use transcript::TranscriptSource;
