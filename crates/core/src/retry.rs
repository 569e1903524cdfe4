//! Host-side retry with exponential backoff and jitter
//!
//! The adapter itself never retries. Hosts wrap individual fallible calls
//! (`exists`, `size`, `retrieve`, `store`, `inventory`) with
//! [`retry_with_backoff`] and use [`is_retryable_error`] to decide which
//! failures are transient.

use std::time::Duration;

use crate::config::RetryConfig;
use crate::error::{Error, Result};

/// Retry a fallible async operation with exponential backoff
///
/// # Example
/// ```ignore
/// let exists = retry_with_backoff(
///     &settings.retry,
///     || object.exists(),
///     is_retryable_error,
/// ).await?;
/// ```
pub async fn retry_with_backoff<T, F, Fut, R>(
    config: &RetryConfig,
    mut operation: F,
    is_retryable: R,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T>>,
    R: Fn(&Error) -> bool,
{
    let mut attempt = 0;

    loop {
        attempt += 1;

        match operation().await {
            Ok(result) => return Ok(result),
            Err(e) => {
                if attempt >= config.max_attempts || !is_retryable(&e) {
                    return Err(e);
                }

                let backoff = calculate_backoff(config, attempt);
                tracing::debug!(
                    attempt = attempt,
                    backoff_ms = backoff.as_millis(),
                    error = %e,
                    "Retrying after transient error"
                );

                tokio::time::sleep(backoff).await;
            }
        }
    }
}

fn calculate_backoff(config: &RetryConfig, attempt: u32) -> Duration {
    // initial * 2^(attempt-1)
    let base_ms = config.initial_backoff_ms * (1u64 << (attempt - 1).min(10));
    let capped_ms = base_ms.min(config.max_backoff_ms);

    Duration::from_millis(capped_ms + rand_jitter(capped_ms))
}

/// Pseudo-random jitter in `0..max` from the clock
fn rand_jitter(max: u64) -> u64 {
    use std::time::SystemTime;
    let nanos = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap_or_default()
        .subsec_nanos() as u64;
    nanos % max.max(1)
}

/// Whether a failure is transient and worth another attempt
pub fn is_retryable_error(error: &Error) -> bool {
    match error {
        Error::Http { status, .. } => *status == 429 || *status == 408 || *status >= 500,
        Error::Network(msg) => {
            let msg_lower = msg.to_lowercase();
            !(msg_lower.contains("builder error")
                || msg_lower.contains("relative url")
                || msg_lower.contains("invalid url"))
        }
        Error::Io(e) => matches!(
            e.kind(),
            std::io::ErrorKind::ConnectionReset
                | std::io::ErrorKind::ConnectionRefused
                | std::io::ErrorKind::ConnectionAborted
                | std::io::ErrorKind::TimedOut
                | std::io::ErrorKind::Interrupted
        ),
        // A corrupted transfer may succeed on a second download
        Error::ChecksumMismatch(_) => true,
        Error::InvalidQuery(_)
        | Error::Config(_)
        | Error::NotFound(_)
        | Error::UnsupportedChecksum(_)
        | Error::Auth(_)
        | Error::UnsupportedOperation(_)
        | Error::NoFiles(_)
        | Error::InvalidResponse(_) => false,
    }
}

/// Builder for [`RetryConfig`]
#[derive(Debug, Clone)]
pub struct RetryBuilder {
    config: RetryConfig,
}

impl RetryBuilder {
    pub fn new() -> Self {
        Self {
            config: RetryConfig::default(),
        }
    }

    pub fn max_attempts(mut self, n: u32) -> Self {
        self.config.max_attempts = n.max(1);
        self
    }

    pub fn initial_backoff_ms(mut self, ms: u64) -> Self {
        self.config.initial_backoff_ms = ms;
        self
    }

    pub fn max_backoff_ms(mut self, ms: u64) -> Self {
        self.config.max_backoff_ms = ms;
        self
    }

    pub fn build(self) -> RetryConfig {
        self.config
    }
}

impl From<RetryConfig> for RetryBuilder {
    fn from(config: RetryConfig) -> Self {
        Self { config }
    }
}

impl Default for RetryBuilder {
    fn default() -> Self {
        Self::new()
    }
}
