use std::collections::VecDeque;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use minutes_core::errors::GatewayError;
use minutes_core::provider::{GenerationProvider, GenerationRequest};

/// One scripted reply of a [`MockProvider`].
#[derive(Clone, Debug)]
pub enum MockResponse {
    /// Return this text as the generated output.
    Text(String),
    /// Fail the call with this error.
    Error(GatewayError),
    /// Wait a duration, then yield the inner response.
    Delay(Duration, Box<MockResponse>),
}

impl MockResponse {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    /// `inner`, after sleeping on the tokio clock.
    pub fn delayed(delay: Duration, inner: MockResponse) -> Self {
        Self::Delay(delay, Box::new(inner))
    }
}

type Responder = Box<dyn Fn(&GenerationRequest) -> MockResponse + Send + Sync>;

enum Script {
    Sequence(Mutex<VecDeque<MockResponse>>),
    Function(Responder),
}

/// Offline [`GenerationProvider`] for tests.
///
/// Either replays a fixed sequence (one entry per call, in call order) or
/// computes each response from the request it receives. Every request is
/// recorded so tests can inspect what the caller sent.
pub struct MockProvider {
    script: Script,
    requests: Mutex<Vec<GenerationRequest>>,
}

impl MockProvider {
    pub fn new(responses: Vec<MockResponse>) -> Self {
        Self::with_script(Script::Sequence(Mutex::new(responses.into())))
    }

    /// Respond based on the request, e.g. echo a chunk back as its summary.
    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn(&GenerationRequest) -> MockResponse + Send + Sync + 'static,
    {
        Self::with_script(Script::Function(Box::new(f)))
    }

    fn with_script(script: Script) -> Self {
        Self {
            script,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().len()
    }

    /// Requests received so far, in arrival order.
    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().clone()
    }

    fn next_response(&self, request: &GenerationRequest, call: usize) -> MockResponse {
        match &self.script {
            Script::Sequence(queue) => queue.lock().pop_front().unwrap_or_else(|| {
                MockResponse::Error(GatewayError::InvalidRequest(format!(
                    "MockProvider: no response configured for call {call}"
                )))
            }),
            Script::Function(f) => f(request),
        }
    }
}

#[async_trait]
impl GenerationProvider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<String, GatewayError> {
        let call = {
            let mut seen = self.requests.lock();
            seen.push(request.clone());
            seen.len() - 1
        };

        let mut response = self.next_response(request, call);
        loop {
            match response {
                MockResponse::Text(text) => return Ok(text),
                MockResponse::Error(e) => return Err(e),
                MockResponse::Delay(delay, inner) => {
                    tokio::time::sleep(delay).await;
                    response = *inner;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use minutes_core::messages::ChatMessage;

    fn request(text: &str) -> GenerationRequest {
        GenerationRequest::new("mock-model", vec![ChatMessage::user(text)])
    }

    #[tokio::test]
    async fn sequence_replayed_in_order() {
        let mock = MockProvider::new(vec![MockResponse::text("one"), MockResponse::text("two")]);
        assert_eq!(mock.generate(&request("a")).await.unwrap(), "one");
        assert_eq!(mock.generate(&request("b")).await.unwrap(), "two");
        assert_eq!(mock.call_count(), 2);
    }

    #[tokio::test]
    async fn exhausted_sequence_errors() {
        let mock = MockProvider::new(vec![]);
        let err = mock.generate(&request("a")).await.unwrap_err();
        assert!(err.to_string().contains("no response configured for call 0"));
    }

    #[tokio::test]
    async fn error_response_returned() {
        let mock = MockProvider::new(vec![MockResponse::Error(GatewayError::ProviderOverloaded)]);
        let err = mock.generate(&request("a")).await.unwrap_err();
        assert!(matches!(err, GatewayError::ProviderOverloaded));
    }

    #[tokio::test(start_paused = true)]
    async fn delayed_response_waits() {
        let mock = MockProvider::new(vec![MockResponse::delayed(
            Duration::from_secs(5),
            MockResponse::text("late"),
        )]);
        let start = tokio::time::Instant::now();
        assert_eq!(mock.generate(&request("a")).await.unwrap(), "late");
        assert!(start.elapsed() >= Duration::from_secs(5));
    }

    #[tokio::test]
    async fn function_sees_request() {
        let mock = MockProvider::from_fn(|req| {
            MockResponse::text(format!("echo: {}", req.messages[0].content))
        });
        assert_eq!(mock.generate(&request("hello")).await.unwrap(), "echo: hello");
    }

    #[tokio::test]
    async fn requests_recorded() {
        let mock = MockProvider::new(vec![MockResponse::text("x"), MockResponse::text("y")]);
        let _ = mock.generate(&request("first")).await;
        let _ = mock.generate(&request("second")).await;
        let seen = mock.requests();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[1].messages[0].content, "second");
    }
}
