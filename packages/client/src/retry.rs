//! Retry and error recovery for chain adapter calls
//!
//! Transient adapter failures (RPC timeouts, connection drops) are retried
//! with exponential backoff up to a bounded attempt count before surfacing.
//! Protocol-level failures are never routed through here: a malformed
//! message or bad attestation is not retryable by definition.

use std::time::Duration;

use eyre::Result;
use tracing::{debug, warn};

/// Retry configuration for adapter calls
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of retry attempts
    pub max_retries: u32,
    /// Initial backoff duration
    pub initial_backoff: Duration,
    /// Maximum backoff duration
    pub max_backoff: Duration,
    /// Backoff multiplier for exponential growth
    pub backoff_multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 5,
            initial_backoff: Duration::from_secs(2),
            max_backoff: Duration::from_secs(60),
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryConfig {
    /// Calculate backoff duration for a given attempt (0-indexed)
    pub fn backoff_for_attempt(&self, attempt: u32) -> Duration {
        let backoff_secs =
            self.initial_backoff.as_secs_f64() * self.backoff_multiplier.powi(attempt as i32);
        let capped = backoff_secs.min(self.max_backoff.as_secs_f64());
        Duration::from_secs_f64(capped)
    }

    /// Check if we should retry based on attempt count
    pub fn should_retry(&self, attempt: u32) -> bool {
        attempt < self.max_retries
    }
}

/// Classifies adapter errors for retry decisions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Temporary failure - should retry (RPC timeout, network issues)
    Transient,
    /// Permanent failure - do not retry (invalid params, rejected tx)
    Permanent,
    /// Unknown error - may retry with backoff
    Unknown,
}

/// Classify an adapter error string for retry decisions
pub fn classify_error(error: &str) -> ErrorClass {
    let error_lower = error.to_lowercase();

    if error_lower.contains("timeout")
        || error_lower.contains("timed out")
        || error_lower.contains("connection")
        || error_lower.contains("network")
        || error_lower.contains("rate limit")
        || error_lower.contains("too many requests")
        || error_lower.contains("503")
        || error_lower.contains("502")
        || error_lower.contains("temporarily unavailable")
    {
        return ErrorClass::Transient;
    }

    if error_lower.contains("reverted")
        || error_lower.contains("invalid signature")
        || error_lower.contains("insufficient funds")
        || error_lower.contains("invalid parameters")
        || error_lower.contains("already executed")
    {
        return ErrorClass::Permanent;
    }

    ErrorClass::Unknown
}

/// Execute an adapter call with retry on transient failures
///
/// Permanent failures surface immediately; transient and unknown failures
/// retry with exponential backoff until the attempt budget runs out.
pub async fn with_retry<F, T, Fut>(config: &RetryConfig, mut operation: F) -> Result<T>
where
    F: FnMut(u32) -> Fut,
    Fut: std::future::Future<Output = Result<T>>,
{
    let mut attempt = 0u32;

    loop {
        match operation(attempt).await {
            Ok(result) => return Ok(result),
            Err(e) => {
                let error_str = e.to_string();
                let class = classify_error(&error_str);

                if class == ErrorClass::Permanent {
                    debug!(error = %error_str, "permanent adapter error, not retrying");
                    return Err(e);
                }
                if !config.should_retry(attempt) {
                    warn!(
                        attempt,
                        max = config.max_retries,
                        error = %error_str,
                        "retry budget exhausted"
                    );
                    return Err(e);
                }

                let backoff = config.backoff_for_attempt(attempt);
                warn!(
                    attempt,
                    max = config.max_retries,
                    ?backoff,
                    error = %error_str,
                    "transient adapter error, retrying after backoff"
                );
                tokio::time::sleep(backoff).await;
                attempt += 1;
            }
        }
    }
}
