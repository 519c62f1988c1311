use std::future::Future;
use std::time::Duration;

use rand::Rng;
use tracing::warn;

use crate::errors::GatewayError;

/// Bounded retry policy: exponential backoff capped at `max_delay`, spread
/// by `±jitter_factor`.
#[derive(Clone, Debug)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub jitter_factor: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            jitter_factor: 0.2,
        }
    }
}

impl RetryConfig {
    /// First failure is final.
    pub fn disabled() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Wait before retry number `attempt` (0-based). A server-suggested
    /// delay wins over the computed one but is still capped at `max_delay`.
    pub fn delay_for(&self, attempt: u32, suggested: Option<Duration>) -> Duration {
        if let Some(delay) = suggested {
            return delay.min(self.max_delay);
        }

        let factor = 1u32 << attempt.min(20);
        let backoff = self.base_delay.saturating_mul(factor).min(self.max_delay);

        let spread = self.jitter_factor.clamp(0.0, 1.0);
        if spread == 0.0 {
            return backoff.max(Duration::from_millis(1));
        }
        let scale = rand::thread_rng().gen_range((1.0 - spread)..=(1.0 + spread));
        backoff.mul_f64(scale).max(Duration::from_millis(1))
    }
}

/// What [`with_retries`] ended with, and how many retries it spent.
#[derive(Debug)]
pub struct RetryOutcome<T> {
    pub result: Result<T, GatewayError>,
    pub retries: u32,
}

/// Call `attempt_fn` until it succeeds, returns a fatal error, or
/// `config.max_retries` retries have been spent.
pub async fn with_retries<T, F, Fut>(config: &RetryConfig, operation: &str, mut attempt_fn: F) -> RetryOutcome<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, GatewayError>>,
{
    let mut retries = 0;
    loop {
        let err = match attempt_fn().await {
            Ok(value) => return RetryOutcome { result: Ok(value), retries },
            Err(err) => err,
        };

        if err.is_fatal() || retries >= config.max_retries {
            return RetryOutcome { result: Err(err), retries };
        }

        let delay = config.delay_for(retries, err.suggested_delay());
        retries += 1;
        warn!(
            operation,
            retry = retries,
            of = config.max_retries,
            wait_ms = delay.as_millis() as u64,
            kind = err.error_kind(),
            error = %err,
            "transient failure, backing off"
        );
        tokio::time::sleep(delay).await;
    }
}
