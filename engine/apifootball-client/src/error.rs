//! Error types for the API-Football client

use thiserror::Error;

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, ApiError>;

/// Errors surfaced to callers of the client.
///
/// Exhausted retries and non-retryable vendor errors are NOT errors at this
/// level: they resolve to "no data" (`Ok(None)` / empty collections) so that
/// callers treat them as soft failures and continue with the next unit of
/// work. Only the daily quota and request-construction failures escape.
#[derive(Error, Debug)]
pub enum ApiError {
    /// The vendor's hard daily quota was hit; never retried, always propagated
    #[error("daily request limit reached: {0}")]
    DailyLimitExceeded(String),

    /// The request could not be issued at all (bad base URL, client build)
    #[error("request failed: {0}")]
    Fatal(String),
}

impl ApiError {
    /// Create a new fatal error
    pub fn fatal(msg: impl Into<String>) -> Self {
        Self::Fatal(msg.into())
    }

    /// True when this error is the daily-quota hard stop
    pub fn is_daily_limit(&self) -> bool {
        matches!(self, Self::DailyLimitExceeded(_))
    }
}
