use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use minutes_core::errors::GatewayError;
use minutes_core::provider::{GenerationProvider, GenerationRequest};
use minutes_core::retry::{with_retries, RetryConfig};

#[derive(Clone, Debug)]
pub struct ReliableConfig {
    pub retry: RetryConfig,
    /// Consecutive failed requests (after retries) that open the breaker.
    pub circuit_breaker_threshold: u32,
    /// How long an open breaker rejects requests before letting one probe through.
    pub circuit_breaker_cooldown: Duration,
}

impl Default for ReliableConfig {
    fn default() -> Self {
        Self {
            retry: RetryConfig::default(),
            circuit_breaker_threshold: 5,
            circuit_breaker_cooldown: Duration::from_secs(60),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum BreakerState {
    Closed,
    Open { since: Instant },
    /// One probe is in flight since `since`.
    HalfOpen { since: Instant },
}

struct Breaker {
    state: BreakerState,
    consecutive_failures: u32,
}

/// Stops calling a provider that keeps failing.
///
/// `Closed` passes everything. `threshold` consecutive failures open it;
/// while `Open`, calls fail fast with [`GatewayError::ProviderOverloaded`].
/// After `cooldown` exactly one probe is let through (`HalfOpen`) and other
/// callers keep failing fast. A successful or fatally rejected probe closes
/// the breaker, a transient failure reopens it. A probe that never reports
/// back (its future was dropped) is replaced after another `cooldown`.
struct CircuitBreaker {
    inner: Mutex<Breaker>,
    threshold: u32,
    cooldown: Duration,
}

impl CircuitBreaker {
    fn new(threshold: u32, cooldown: Duration) -> Self {
        Self {
            inner: Mutex::new(Breaker {
                state: BreakerState::Closed,
                consecutive_failures: 0,
            }),
            threshold,
            cooldown,
        }
    }

    fn admit(&self) -> Result<(), GatewayError> {
        let mut breaker = self.inner.lock();
        match breaker.state {
            BreakerState::Closed => Ok(()),
            BreakerState::Open { since } | BreakerState::HalfOpen { since } if since.elapsed() < self.cooldown => {
                Err(GatewayError::ProviderOverloaded)
            }
            BreakerState::Open { .. } | BreakerState::HalfOpen { .. } => {
                debug!("circuit breaker half-open, sending probe");
                breaker.state = BreakerState::HalfOpen { since: Instant::now() };
                Ok(())
            }
        }
    }

    fn on_success(&self) {
        let mut breaker = self.inner.lock();
        breaker.consecutive_failures = 0;
        if breaker.state != BreakerState::Closed {
            info!("circuit breaker closed");
            breaker.state = BreakerState::Closed;
        }
    }

    /// A fatal error still proves the upstream answers.
    fn on_fatal(&self) {
        let mut breaker = self.inner.lock();
        if let BreakerState::HalfOpen { .. } = breaker.state {
            info!("circuit breaker closed");
            breaker.consecutive_failures = 0;
            breaker.state = BreakerState::Closed;
        }
    }

    fn on_failure(&self) {
        let mut breaker = self.inner.lock();
        breaker.consecutive_failures += 1;
        let reopen = matches!(breaker.state, BreakerState::HalfOpen { .. });
        if reopen || breaker.consecutive_failures >= self.threshold {
            if !matches!(breaker.state, BreakerState::Open { .. }) {
                warn!(
                    failures = breaker.consecutive_failures,
                    cooldown_ms = self.cooldown.as_millis() as u64,
                    "circuit breaker opened"
                );
            }
            breaker.state = BreakerState::Open { since: Instant::now() };
        }
    }

    fn state_name(&self) -> &'static str {
        match self.inner.lock().state {
            BreakerState::Closed => "closed",
            BreakerState::Open { .. } => "open",
            BreakerState::HalfOpen { .. } => "half_open",
        }
    }
}

/// A [`GenerationProvider`] that retries transient failures with backoff
/// and sheds load through a circuit breaker once the upstream looks down.
/// Fatal errors pass straight through and do not count against the breaker.
pub struct ReliableProvider<P: GenerationProvider> {
    inner: P,
    retry: RetryConfig,
    breaker: CircuitBreaker,
    total_retries: AtomicU64,
}

impl<P: GenerationProvider> ReliableProvider<P> {
    pub fn new(inner: P, config: ReliableConfig) -> Self {
        Self {
            inner,
            breaker: CircuitBreaker::new(config.circuit_breaker_threshold, config.circuit_breaker_cooldown),
            retry: config.retry,
            total_retries: AtomicU64::new(0),
        }
    }

    pub fn with_defaults(inner: P) -> Self {
        Self::new(inner, ReliableConfig::default())
    }

    pub fn inner(&self) -> &P {
        &self.inner
    }

    /// Retries performed over the provider's lifetime.
    pub fn total_retries(&self) -> u64 {
        self.total_retries.load(Ordering::Relaxed)
    }

    pub fn circuit_state_name(&self) -> &'static str {
        self.breaker.state_name()
    }
}

#[async_trait]
impl<P: GenerationProvider> GenerationProvider for ReliableProvider<P> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<String, GatewayError> {
        self.breaker.admit()?;

        let outcome = with_retries(&self.retry, "generate", || self.inner.generate(request)).await;
        let _ = self
            .total_retries
            .fetch_add(u64::from(outcome.retries), Ordering::Relaxed);

        match &outcome.result {
            Ok(_) => self.breaker.on_success(),
            Err(e) if e.is_retryable() => self.breaker.on_failure(),
            Err(_) => self.breaker.on_fatal(),
        }
        outcome.result
    }
}
