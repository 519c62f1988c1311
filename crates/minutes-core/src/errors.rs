use std::time::Duration;

/// Whether repeating a failed call can help.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorClass {
    /// Transient upstream or network trouble.
    Retryable,
    /// The same request will fail the same way.
    Fatal,
}

/// Failure of a call to an external service: text generation or
/// transcript retrieval.
#[derive(Clone, Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),
    #[error("request exceeds the model context window: {0}")]
    ContextWindowExceeded(String),
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    #[error("rate limited by upstream")]
    RateLimited { retry_after: Option<Duration> },
    #[error("upstream returned {status}: {body}")]
    ServerError { status: u16, body: String },
    #[error("upstream overloaded")]
    ProviderOverloaded,
    #[error("connection failed: {0}")]
    NetworkError(String),
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
}

impl GatewayError {
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::RateLimited { .. }
            | Self::ServerError { .. }
            | Self::ProviderOverloaded
            | Self::NetworkError(_)
            | Self::Timeout(_) => ErrorClass::Retryable,
            Self::AuthenticationFailed(_)
            | Self::ContextWindowExceeded(_)
            | Self::InvalidRequest(_)
            | Self::NotFound(_)
            | Self::MalformedResponse(_) => ErrorClass::Fatal,
        }
    }

    pub fn is_retryable(&self) -> bool {
        self.class() == ErrorClass::Retryable
    }

    pub fn is_fatal(&self) -> bool {
        self.class() == ErrorClass::Fatal
    }

    /// Server-provided wait before the next attempt, if any.
    pub fn suggested_delay(&self) -> Option<Duration> {
        match self {
            Self::RateLimited { retry_after } => *retry_after,
            _ => None,
        }
    }

    /// Stable snake_case name, used as a log field.
    pub fn error_kind(&self) -> &'static str {
        match self {
            Self::AuthenticationFailed(_) => "authentication_failed",
            Self::ContextWindowExceeded(_) => "context_window_exceeded",
            Self::InvalidRequest(_) => "invalid_request",
            Self::NotFound(_) => "not_found",
            Self::MalformedResponse(_) => "malformed_response",
            Self::RateLimited { .. } => "rate_limited",
            Self::ServerError { .. } => "server_error",
            Self::ProviderOverloaded => "provider_overloaded",
            Self::NetworkError(_) => "network_error",
            Self::Timeout(_) => "timeout",
        }
    }

    /// Map a non-success HTTP status and its body to an error.
    pub fn from_status(status: u16, body: String) -> Self {
        match status {
            401 | 403 => Self::AuthenticationFailed(body),
            400 if body.contains("context_length_exceeded") => Self::ContextWindowExceeded(body),
            400 | 422 => Self::InvalidRequest(body),
            404 => Self::NotFound(body),
            429 => Self::RateLimited { retry_after: None },
            503 | 529 => Self::ProviderOverloaded,
            500..=599 => Self::ServerError { status, body },
            other => Self::InvalidRequest(format!("unexpected status {other}: {body}")),
        }
    }

    /// [`from_status`](Self::from_status) plus a `Retry-After` header in
    /// whole seconds. HTTP-date values are ignored.
    pub fn from_status_with_retry_after(status: u16, body: String, retry_after: Option<&str>) -> Self {
        let err = Self::from_status(status, body);
        if let Self::RateLimited { .. } = err {
            let secs = retry_after.and_then(|v| v.trim().parse::<u64>().ok());
            return Self::RateLimited {
                retry_after: secs.map(Duration::from_secs),
            };
        }
        err
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_failures_are_retryable() {
        let transient = [
            GatewayError::RateLimited { retry_after: None },
            GatewayError::ServerError {
                status: 502,
                body: String::new(),
            },
            GatewayError::ProviderOverloaded,
            GatewayError::NetworkError("connection reset".into()),
            GatewayError::Timeout(Duration::from_secs(120)),
        ];
        for err in transient {
            assert_eq!(err.class(), ErrorClass::Retryable, "{err}");
            assert!(!err.is_fatal());
        }
    }

    #[test]
    fn request_problems_are_fatal() {
        let fatal = [
            GatewayError::AuthenticationFailed("bad key".into()),
            GatewayError::ContextWindowExceeded("too long".into()),
            GatewayError::InvalidRequest("missing model".into()),
            GatewayError::NotFound("transcribe-job-x".into()),
            GatewayError::MalformedResponse("no choices".into()),
        ];
        for err in fatal {
            assert!(err.is_fatal(), "{err}");
            assert!(!err.is_retryable());
        }
    }

    #[test]
    fn only_rate_limits_suggest_a_delay() {
        let limited = GatewayError::RateLimited {
            retry_after: Some(Duration::from_secs(5)),
        };
        assert_eq!(limited.suggested_delay(), Some(Duration::from_secs(5)));
        assert_eq!(GatewayError::ProviderOverloaded.suggested_delay(), None);
    }

    #[test]
    fn statuses_classified() {
        let cases: [(u16, &str, &str); 9] = [
            (401, "unauthorized", "authentication_failed"),
            (403, "forbidden", "authentication_failed"),
            (400, r#"{"error":{"code":"context_length_exceeded"}}"#, "context_window_exceeded"),
            (400, "bad request", "invalid_request"),
            (404, "no such job", "not_found"),
            (429, "slow down", "rate_limited"),
            (503, "unavailable", "provider_overloaded"),
            (502, "bad gateway", "server_error"),
            (418, "teapot", "invalid_request"),
        ];
        for (status, body, kind) in cases {
            assert_eq!(GatewayError::from_status(status, body.into()).error_kind(), kind, "{status}");
        }
    }

    #[test]
    fn retry_after_seconds_honoured() {
        let err = GatewayError::from_status_with_retry_after(429, String::new(), Some(" 7 "));
        assert_eq!(err.suggested_delay(), Some(Duration::from_secs(7)));

        let err = GatewayError::from_status_with_retry_after(429, String::new(), Some("Wed, 21 Oct 2026 07:28:00 GMT"));
        assert_eq!(err.suggested_delay(), None);

        let err = GatewayError::from_status_with_retry_after(500, "x".into(), Some("7"));
        assert!(matches!(err, GatewayError::ServerError { status: 500, .. }));
    }
}
