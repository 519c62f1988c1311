pub mod mock;
pub mod openai;
pub mod reliable;

pub use mock::{MockProvider, MockResponse};
pub use openai::{OpenAIConfig, OpenAIProvider};
pub use reliable::{ReliableConfig, ReliableProvider};
