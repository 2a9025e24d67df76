//! Rate limiting for the Telegram Bot API.
//!
//! Telegram enforces several overlapping limits on bots. Exceeding them
//! results in `429 Too Many Requests` errors and temporary bans, so every
//! outgoing request is counted against sliding windows before it is sent.
//!
//! ## Scopes
//!
//! - **Global**: all requests made by the bot
//! - **Method**: requests to one Bot API method
//! - **Chat**: messages to a single chat
//! - **Group**: messages to a single group (applied to every chat)
//!
//! ## Example
//!
//! ```rust
//! use telegram_api_client::rate_limit::{RateLimitConfig, RateLimiter};
//! use telegram_api_client::types::{MethodName, RequestDescriptor};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let limiter = RateLimiter::new(RateLimitConfig::default());
//! let request = RequestDescriptor::new(MethodName::SEND_MESSAGE).chat(42);
//!
//! // Waits until the global, method, chat and group scopes all admit.
//! let sent = limiter.with_rate_limit(&request, || async { "sent" }).await;
//! assert_eq!(sent, "sent");
//! # }
//! ```
//!
//! ## Low-Level Rate Limiters
//!
//! ```rust
//! use std::time::Duration;
//! use telegram_api_client::rate_limit::{LimiterRegistry, Scope, ScopeKey, ScopeLimit};
//!
//! let registry = LimiterRegistry::new();
//! let scope = Scope::new(ScopeKey::global(), ScopeLimit::new(Duration::from_millis(100), 30));
//! assert!(registry.check_and_admit(&scope).is_admitted());
//! ```

mod limiter;
mod registry;
mod scope;
mod window;

pub use limiter::RateLimiter;
pub use registry::LimiterRegistry;
pub use scope::{Admission, Scope, ScopeKey, ScopeKind, ScopeLimit};
pub use window::SlidingWindow;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Rate limiter configuration.
///
/// Deserializes from e.g.
/// `{"global": {"window_ms": 1000, "max_count": 30}, "method_overrides": {"sendPhoto": {"window_ms": 1000, "max_count": 5}}}`;
/// omitted fields keep their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Whether to enable rate limiting.
    pub enabled: bool,
    /// Limit across all requests.
    pub global: ScopeLimit,
    /// Limit per target chat.
    pub chat: ScopeLimit,
    /// Limit per target group.
    pub group: ScopeLimit,
    /// Per-method limit for methods without an override.
    pub default_method: ScopeLimit,
    /// Per-method limits keyed by Bot API method name.
    pub method_overrides: HashMap<String, ScopeLimit>,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            global: limits::GLOBAL,
            chat: limits::PER_CHAT,
            group: limits::PER_GROUP,
            default_method: limits::PER_METHOD,
            method_overrides: HashMap::new(),
        }
    }
}

impl RateLimitConfig {
    /// Override the limit for one method.
    pub fn with_method_limit(mut self, method: impl Into<String>, limit: ScopeLimit) -> Self {
        self.method_overrides.insert(method.into(), limit);
        self
    }

    /// The limit that applies to a method.
    pub fn method_limit(&self, method: &str) -> ScopeLimit {
        self.method_overrides
            .get(method)
            .copied()
            .unwrap_or(self.default_method)
    }
}

/// Default limits.
pub mod limits {
    use std::time::Duration;

    use super::ScopeLimit;

    /// 30 requests per 100ms across the whole bot.
    pub const GLOBAL: ScopeLimit = ScopeLimit::new(Duration::from_millis(100), 30);
    /// 1 request per 100ms to the same chat.
    pub const PER_CHAT: ScopeLimit = ScopeLimit::new(Duration::from_millis(100), 1);
    /// 20 requests per minute to the same group.
    pub const PER_GROUP: ScopeLimit = ScopeLimit::new(Duration::from_millis(60_000), 20);
    /// Methods without an override share the global figures.
    pub const PER_METHOD: ScopeLimit = GLOBAL;
}
