//! The single entry point every outgoing Bot API call goes through.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tracing::Instrument;

use crate::error::{RawError, TelegramError};
use crate::rate_limit::{LimiterRegistry, RateLimitConfig, RateLimiter};
use crate::retry::{JitterSource, RandomJitter, RetryConfig, with_retries};
use crate::types::{MethodName, RequestDescriptor};

/// Per-call overrides for [`RequestHandler::request_with_handling`].
///
/// # Example
///
/// ```rust
/// use std::time::Duration;
/// use telegram_api_client::client::RequestOptions;
///
/// let opts = RequestOptions::new()
///     .max_retries(5)
///     .initial_delay(Duration::from_millis(200));
/// assert!(!opts.skip_rate_limit);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestOptions {
    /// Send without consulting the rate limiter.
    pub skip_rate_limit: bool,
    /// Make exactly one attempt and return its raw result.
    pub skip_retries: bool,
    /// Overrides [`RetryConfig::max_retries`].
    pub max_retries: Option<u32>,
    /// Overrides [`RetryConfig::initial_delay`].
    pub initial_delay: Option<Duration>,
    /// Overrides [`RetryConfig::max_delay`].
    pub max_delay: Option<Duration>,
}

impl RequestOptions {
    /// Default options: rate limited and retried.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bypass the rate limiter.
    pub fn skip_rate_limit(mut self) -> Self {
        self.skip_rate_limit = true;
        self
    }

    /// Bypass the retry loop.
    pub fn skip_retries(mut self) -> Self {
        self.skip_retries = true;
        self
    }

    /// Set the maximum number of retries.
    pub fn max_retries(mut self, retries: u32) -> Self {
        self.max_retries = Some(retries);
        self
    }

    /// Set the initial backoff delay.
    pub fn initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = Some(delay);
        self
    }

    /// Set the backoff cap.
    pub fn max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = Some(delay);
        self
    }

    /// Apply these overrides on top of a base retry configuration.
    ///
    /// The result is not validated; see [`RetryConfig::validate`].
    pub fn retry_config(&self, base: &RetryConfig) -> RetryConfig {
        RetryConfig {
            max_retries: self.max_retries.unwrap_or(base.max_retries),
            initial_delay: self.initial_delay.unwrap_or(base.initial_delay),
            max_delay: self.max_delay.unwrap_or(base.max_delay),
        }
    }
}

/// Composes the rate limiter and the retry loop around a unit of work.
///
/// # Example
///
/// ```rust
/// use serde_json::json;
/// use telegram_api_client::client::{RequestHandler, RequestOptions};
/// use telegram_api_client::error::RawError;
/// use telegram_api_client::types::MethodName;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let handler = RequestHandler::default();
/// let params = json!({ "chat_id": 42, "text": "hello" });
///
/// let result = handler
///     .request_with_handling(
///         MethodName::SEND_MESSAGE,
///         &params,
///         || async { Ok::<_, RawError>(json!({ "message_id": 1 })) },
///         &RequestOptions::default(),
///     )
///     .await;
/// assert!(result.is_ok());
/// # }
/// ```
#[derive(Clone)]
pub struct RequestHandler {
    limiter: RateLimiter,
    retry: RetryConfig,
    jitter: Arc<dyn JitterSource>,
}

impl RequestHandler {
    /// Create a new handler builder.
    pub fn builder() -> RequestHandlerBuilder {
        RequestHandlerBuilder::new()
    }

    /// The rate limiter used for all requests.
    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    /// The default retry configuration.
    pub fn retry_config(&self) -> &RetryConfig {
        &self.retry
    }

    /// Clear all rate limit state.
    pub fn reset_all(&self) {
        self.limiter.reset_all();
    }

    /// Run `work` for a Bot API call with rate limiting and retries.
    ///
    /// `params` is the call's parameter bag; only `chat_id` is read from it.
    /// When both stages are active, the whole retry sequence runs inside a
    /// single rate limit admission: retries do not re-check the limiter.
    ///
    /// Unless retries are skipped, the retry settings merged from `opts`
    /// must pass [`RetryConfig::validate`]; otherwise
    /// [`TelegramError::InvalidConfig`] is returned and `work` never runs.
    pub async fn request_with_handling<T, F, Fut>(
        &self,
        method: impl Into<MethodName>,
        params: &Value,
        mut work: F,
        opts: &RequestOptions,
    ) -> crate::Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, RawError>>,
    {
        let retry = opts.retry_config(&self.retry);
        if !opts.skip_retries {
            retry.validate()?;
        }

        let request = RequestDescriptor::from_params(method, params);
        let span = tracing::debug_span!(
            "telegram_request",
            method = %request.method,
            chat_id = request.chat_id.as_ref().map(tracing::field::display),
        );

        async {
            let jitter = self.jitter.as_ref();

            match (opts.skip_rate_limit, opts.skip_retries) {
                (true, true) => work().await.map_err(TelegramError::Api),
                (true, false) => with_retries(work, &retry, jitter).await,
                (false, true) => self
                    .limiter
                    .with_rate_limit(&request, work)
                    .await
                    .map_err(TelegramError::Api),
                (false, false) => {
                    self.limiter
                        .with_rate_limit(&request, || with_retries(work, &retry, jitter))
                        .await
                }
            }
        }
        .instrument(span)
        .await
    }
}

impl Default for RequestHandler {
    fn default() -> Self {
        Self {
            limiter: RateLimiter::default(),
            retry: RetryConfig::default(),
            jitter: Arc::new(RandomJitter),
        }
    }
}

impl std::fmt::Debug for RequestHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestHandler")
            .field("limiter", &self.limiter)
            .field("retry", &self.retry)
            .finish()
    }
}

/// Builder for [`RequestHandler`].
#[derive(Default)]
pub struct RequestHandlerBuilder {
    rate_limit: RateLimitConfig,
    registry: Option<Arc<LimiterRegistry>>,
    retry: RetryConfig,
    jitter: Option<Arc<dyn JitterSource>>,
}

impl RequestHandlerBuilder {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the rate limit configuration.
    pub fn rate_limit(mut self, config: RateLimitConfig) -> Self {
        self.rate_limit = config;
        self
    }

    /// Count against an existing registry instead of a fresh one.
    pub fn registry(mut self, registry: Arc<LimiterRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Set the default retry configuration.
    pub fn retry(mut self, config: RetryConfig) -> Self {
        self.retry = config;
        self
    }

    /// Set a custom jitter source.
    pub fn jitter(mut self, jitter: Arc<dyn JitterSource>) -> Self {
        self.jitter = Some(jitter);
        self
    }

    /// Build the handler.
    ///
    /// Fails if the retry configuration is invalid.
    pub fn build(self) -> crate::Result<RequestHandler> {
        self.retry.validate()?;

        let limiter = match self.registry {
            Some(registry) => RateLimiter::with_registry(self.rate_limit, registry),
            None => RateLimiter::new(self.rate_limit),
        };

        Ok(RequestHandler {
            limiter,
            retry: self.retry,
            jitter: self.jitter.unwrap_or_else(|| Arc::new(RandomJitter)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    use serde_json::json;
    use tokio::time::Instant;

    use crate::rate_limit::ScopeKind;
    use crate::retry::NoJitter;

    fn handler() -> RequestHandler {
        RequestHandler::builder()
            .retry(RetryConfig {
                max_retries: 3,
                initial_delay: Duration::from_millis(10),
                max_delay: Duration::from_millis(100),
            })
            .jitter(Arc::new(NoJitter))
            .build()
            .unwrap()
    }

    #[test]
    fn test_options_override_retry_config() {
        let base = RetryConfig::default();
        let opts = RequestOptions::new()
            .max_retries(0)
            .max_delay(Duration::from_secs(2));

        let merged = opts.retry_config(&base);
        assert_eq!(merged.max_retries, 0);
        assert_eq!(merged.initial_delay, base.initial_delay);
        assert_eq!(merged.max_delay, Duration::from_secs(2));
    }

    #[test]
    fn test_builder_rejects_invalid_retry_config() {
        let result = RequestHandler::builder()
            .retry(RetryConfig {
                max_retries: 1,
                initial_delay: Duration::ZERO,
                max_delay: Duration::from_secs(1),
            })
            .build();
        assert!(matches!(result, Err(TelegramError::InvalidConfig(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalid_per_call_retry_options_are_rejected() {
        let handler = handler();
        let calls = AtomicU32::new(0);

        for opts in [
            RequestOptions::new().initial_delay(Duration::ZERO),
            RequestOptions::new()
                .initial_delay(Duration::from_secs(5))
                .max_delay(Duration::from_secs(1)),
        ] {
            let result = handler
                .request_with_handling(
                    MethodName::SEND_MESSAGE,
                    &json!({ "chat_id": 1 }),
                    || {
                        calls.fetch_add(1, Ordering::SeqCst);
                        async { Ok::<_, RawError>(()) }
                    },
                    &opts,
                )
                .await;
            assert!(matches!(result, Err(TelegramError::InvalidConfig(_))));
        }

        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(handler.limiter().registry().tracked_scopes(), 0);

        // Without retries the delays are never used.
        let result = handler
            .request_with_handling(
                MethodName::SEND_MESSAGE,
                &json!({ "chat_id": 1 }),
                || async { Ok::<_, RawError>(()) },
                &RequestOptions::new().skip_retries().initial_delay(Duration::ZERO),
            )
            .await;
        assert_eq!(result, Ok(()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_skip_retries_returns_raw_error() {
        let handler = handler();
        let calls = AtomicU32::new(0);

        let result: crate::Result<()> = handler
            .request_with_handling(
                MethodName::SEND_MESSAGE,
                &json!({ "chat_id": 1 }),
                || {
                    calls.fetch_add(1, Ordering::SeqCst);
                    async { Err(RawError::text("Bad Gateway")) }
                },
                &RequestOptions::new().skip_retries(),
            )
            .await;

        assert_eq!(result, Err(TelegramError::Api(RawError::text("Bad Gateway"))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_skip_rate_limit_leaves_no_scope_state() {
        let handler = handler();

        let result = handler
            .request_with_handling(
                MethodName::SEND_MESSAGE,
                &json!({ "chat_id": 1 }),
                || async { Ok::<_, RawError>(1) },
                &RequestOptions::new().skip_rate_limit(),
            )
            .await;

        assert_eq!(result, Ok(1));
        assert_eq!(handler.limiter().registry().tracked_scopes(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_skip_both_runs_work_once() {
        let handler = handler();
        let calls = AtomicU32::new(0);

        let result: crate::Result<()> = handler
            .request_with_handling(
                "sendPoll",
                &json!({}),
                || {
                    calls.fetch_add(1, Ordering::SeqCst);
                    async { Err(RawError::text("connection reset")) }
                },
                &RequestOptions::new().skip_rate_limit().skip_retries(),
            )
            .await;

        assert!(matches!(result, Err(TelegramError::Api(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(handler.limiter().registry().tracked_scopes(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_run_inside_one_admission() {
        let handler = handler();
        let calls = AtomicU32::new(0);
        let params = json!({ "chat_id": 99 });

        let result = handler
            .request_with_handling(
                MethodName::SEND_MESSAGE,
                &params,
                || {
                    let n = calls.fetch_add(1, Ordering::SeqCst);
                    async move {
                        if n < 2 {
                            Err(RawError::text("Bad Gateway"))
                        } else {
                            Ok(n)
                        }
                    }
                },
                &RequestOptions::default(),
            )
            .await;

        assert_eq!(result, Ok(2));
        // One admission was counted, not one per attempt.
        let group = handler
            .limiter()
            .scopes_for(&RequestDescriptor::from_params(MethodName::SEND_MESSAGE, &params))
            .into_iter()
            .find(|scope| scope.key.kind == ScopeKind::Group)
            .unwrap();
        assert_eq!(
            handler.limiter().registry().remaining(&group),
            group.limit.max_count() - 1
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_all_lets_next_request_through_immediately() {
        let handler = handler();
        let params = json!({ "chat_id": 5 });
        let send = || async { Ok::<_, RawError>(()) };

        handler
            .request_with_handling(MethodName::SEND_MESSAGE, &params, send, &RequestOptions::default())
            .await
            .unwrap();

        handler.reset_all();
        let start = Instant::now();
        handler
            .request_with_handling(MethodName::SEND_MESSAGE, &params, send, &RequestOptions::default())
            .await
            .unwrap();

        assert_eq!(start.elapsed(), Duration::ZERO);
    }
}
