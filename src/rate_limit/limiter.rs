//! Multi-scope rate limiter for outgoing Bot API requests.

use std::future::Future;
use std::sync::Arc;

use crate::rate_limit::{Admission, LimiterRegistry, RateLimitConfig, Scope, ScopeKey};
use crate::types::RequestDescriptor;

/// Gates requests against the global, method, chat and group scopes.
///
/// Cloning is cheap and clones share the same [`LimiterRegistry`].
///
/// Waiters are not queued: when several callers are waiting on the same
/// scope, whichever re-checks first after a slot frees up is admitted.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    config: RateLimitConfig,
    registry: Arc<LimiterRegistry>,
}

impl RateLimiter {
    /// Create a rate limiter with its own registry.
    pub fn new(config: RateLimitConfig) -> Self {
        Self::with_registry(config, Arc::new(LimiterRegistry::new()))
    }

    /// Create a rate limiter that counts against an existing registry.
    pub fn with_registry(config: RateLimitConfig, registry: Arc<LimiterRegistry>) -> Self {
        Self { config, registry }
    }

    /// Get the current configuration.
    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    /// Get the shared scope state.
    pub fn registry(&self) -> &Arc<LimiterRegistry> {
        &self.registry
    }

    /// Enable or disable rate limiting.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.config.enabled = enabled;
    }

    /// The scopes a request is checked against, in check order.
    ///
    /// Every request is checked against the global and method scopes. Requests
    /// with a target chat are also checked against that chat's scope and its
    /// group scope; the chat type is unknown, so every chat is treated as a
    /// potential group.
    pub fn scopes_for(&self, request: &RequestDescriptor) -> Vec<Scope> {
        let mut scopes = Vec::with_capacity(4);
        scopes.push(Scope::new(ScopeKey::global(), self.config.global));
        scopes.push(Scope::new(
            ScopeKey::method(&request.method),
            self.config.method_limit(request.method.as_str()),
        ));
        if let Some(chat_id) = &request.chat_id {
            scopes.push(Scope::new(ScopeKey::chat(chat_id), self.config.chat));
            scopes.push(Scope::new(ScopeKey::group(chat_id), self.config.group));
        }
        scopes
    }

    /// Run one pass over the request's scopes.
    ///
    /// Stops at the first scope that denies. Scopes checked before it keep
    /// the request they just recorded.
    pub fn try_admit(&self, request: &RequestDescriptor) -> Admission {
        for scope in self.scopes_for(request) {
            let admission = self.registry.check_and_admit(&scope);
            if let Admission::Deny { wait } = admission {
                tracing::debug!(
                    method = %request.method,
                    scope = %scope.key,
                    wait_ms = admission.wait_ms(),
                    "rate limit scope denied request"
                );
                return Admission::Deny { wait };
            }
        }
        Admission::Admitted
    }

    /// Wait until every scope for the request admits it at once.
    ///
    /// After any denial the whole pass restarts from the global scope, since
    /// other scopes may have filled up during the wait.
    pub async fn wait(&self, request: &RequestDescriptor) {
        if !self.config.enabled {
            return;
        }

        loop {
            match self.try_admit(request) {
                Admission::Admitted => return,
                Admission::Deny { wait } => tokio::time::sleep(wait).await,
            }
        }
    }

    /// Wait for admission, then run `work` and return its output unchanged.
    pub async fn with_rate_limit<F, Fut, R>(&self, request: &RequestDescriptor, work: F) -> R
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = R>,
    {
        self.wait(request).await;
        work().await
    }

    /// Clear all scope state.
    pub fn reset_all(&self) {
        self.registry.reset_all();
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(RateLimitConfig::default())
    }
}
