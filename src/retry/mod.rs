//! Retrying transient Telegram failures with exponential backoff.
//!
//! Each failure is [classified](classify()) first. Fatal failures end the
//! operation at once. Retryable failures are retried after
//! `max(suggested_delay, backoff)`, where
//! `backoff = min(initial_delay * 2^attempt + jitter, max_delay)` and the
//! jitter is uniform in `[0, initial_delay * 2^attempt / 4]`.
//!
//! ## Example
//!
//! ```rust
//! use telegram_api_client::error::RawError;
//! use telegram_api_client::retry::{NoJitter, RetryConfig, with_retries};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let config = RetryConfig::default();
//! let result = with_retries(|| async { Ok::<_, RawError>(1) }, &config, &NoJitter).await;
//! assert_eq!(result, Ok(1));
//! # }
//! ```

mod classify;
mod jitter;

pub use classify::{
    BAD_GATEWAY_DELAY, ErrorClass, FLOOD_DEFAULT_DELAY, GATEWAY_TIMEOUT_DELAY, NETWORK_DELAY,
    SERVICE_UNAVAILABLE_DELAY, classify,
};
pub use jitter::{JitterSource, NoJitter, RandomJitter, SeededJitter};

use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{RawError, TelegramError};
use crate::types::serde_helpers::duration_ms;

/// Retry configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Maximum number of retries after the first attempt.
    pub max_retries: u32,
    /// Base delay for the first retry.
    #[serde(rename = "initial_delay_ms", with = "duration_ms")]
    pub initial_delay: Duration,
    /// Upper bound for the computed backoff.
    #[serde(rename = "max_delay_ms", with = "duration_ms")]
    pub max_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_millis(1000),
            max_delay: Duration::from_millis(30_000),
        }
    }
}

impl RetryConfig {
    /// Check that the delays are usable.
    pub fn validate(&self) -> crate::Result<()> {
        if self.initial_delay.is_zero() || self.max_delay.is_zero() {
            return Err(TelegramError::InvalidConfig(
                "retry delays must be positive".to_string(),
            ));
        }
        if self.initial_delay > self.max_delay {
            return Err(TelegramError::InvalidConfig(format!(
                "initial_delay ({:?}) exceeds max_delay ({:?})",
                self.initial_delay, self.max_delay
            )));
        }
        Ok(())
    }

    /// Backoff before jitter for a 0-based attempt, capped at `max_delay`.
    pub fn base_delay(&self, attempt: u32) -> Duration {
        let multiplier = 2u32.saturating_pow(attempt);
        self.initial_delay
            .saturating_mul(multiplier)
            .min(self.max_delay)
    }

    /// Backoff including jitter for a 0-based attempt, capped at `max_delay`.
    pub fn backoff_delay(&self, attempt: u32, jitter: &dyn JitterSource) -> Duration {
        let base = self.base_delay(attempt);
        if base >= self.max_delay {
            return self.max_delay;
        }
        (base + jitter.jitter(base / 4)).min(self.max_delay)
    }
}

/// Progress of one retried operation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RetryAttempt {
    /// 0-based number of the attempt in progress
    pub number: u32,
    /// Time spent sleeping between attempts so far
    pub total_delay: Duration,
}

impl RetryAttempt {
    fn advance(&mut self, delay: Duration) {
        self.number += 1;
        self.total_delay += delay;
    }
}

/// Run `work`, retrying transient failures.
///
/// Makes at most `config.max_retries + 1` attempts. Returns the first
/// success, the normalized fatal error, or the last raw error once retries
/// are exhausted.
pub async fn with_retries<T, F, Fut>(
    mut work: F,
    config: &RetryConfig,
    jitter: &dyn JitterSource,
) -> crate::Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, RawError>>,
{
    let mut attempt = RetryAttempt::default();

    loop {
        let error = match work().await {
            Ok(value) => {
                if attempt.number > 0 {
                    tracing::info!(
                        attempts = attempt.number + 1,
                        total_delay_ms = duration_ms::as_millis(attempt.total_delay),
                        "request succeeded after retrying"
                    );
                }
                return Ok(value);
            }
            Err(error) => error,
        };

        match classify(&error) {
            ErrorClass::Fatal(reason) => {
                tracing::debug!(attempt = attempt.number, error = %error, "fatal Telegram error");
                return Err(reason);
            }
            ErrorClass::Retryable { delay } => {
                if attempt.number >= config.max_retries {
                    tracing::warn!(
                        attempts = attempt.number + 1,
                        total_delay_ms = duration_ms::as_millis(attempt.total_delay),
                        error = %error,
                        "retries exhausted"
                    );
                    return Err(TelegramError::Api(error));
                }

                let wait = delay.max(config.backoff_delay(attempt.number, jitter));
                tracing::warn!(
                    attempt = attempt.number,
                    delay_ms = duration_ms::as_millis(wait),
                    error = %error,
                    "retryable Telegram error, backing off"
                );
                tokio::time::sleep(wait).await;
                attempt.advance(wait);
            }
        }
    }
}
