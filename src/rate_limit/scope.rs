//! Rate limit scopes.
//!
//! A scope is one independently counted bucket: the whole bot (global), one
//! chat, one group, or one Bot API method. A single request is usually
//! checked against several scopes.

use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::TelegramError;
use crate::types::serde_helpers::duration_ms;
use crate::types::{ChatId, MethodName};

/// The kind of bucket a scope counts against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScopeKind {
    /// Every request made by the bot
    Global,
    /// Requests addressed to one chat
    Chat,
    /// Requests addressed to one group chat
    Group,
    /// Requests to one Bot API method
    Method,
}

impl std::fmt::Display for ScopeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScopeKind::Global => write!(f, "global"),
            ScopeKind::Chat => write!(f, "chat"),
            ScopeKind::Group => write!(f, "group"),
            ScopeKind::Method => write!(f, "method"),
        }
    }
}

/// Identity of one scope instance: its kind plus an optional key.
///
/// Displays and parses as `global`, `chat:<id>`, `group:<id>` or
/// `method:<name>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ScopeKey {
    /// Bucket kind
    pub kind: ScopeKind,
    /// Chat id or method name; `None` for the global scope
    pub key: Option<String>,
}

impl ScopeKey {
    /// The bot-wide scope.
    pub fn global() -> Self {
        Self {
            kind: ScopeKind::Global,
            key: None,
        }
    }

    /// The per-chat scope for a chat.
    pub fn chat(chat_id: &ChatId) -> Self {
        Self {
            kind: ScopeKind::Chat,
            key: Some(chat_id.to_string()),
        }
    }

    /// The per-group scope for a chat.
    pub fn group(chat_id: &ChatId) -> Self {
        Self {
            kind: ScopeKind::Group,
            key: Some(chat_id.to_string()),
        }
    }

    /// The per-method scope for a method.
    pub fn method(method: &MethodName) -> Self {
        Self {
            kind: ScopeKind::Method,
            key: Some(method.to_string()),
        }
    }
}

impl std::fmt::Display for ScopeKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.key {
            Some(key) => write!(f, "{}:{}", self.kind, key),
            None => write!(f, "{}", self.kind),
        }
    }
}

impl FromStr for ScopeKey {
    type Err = TelegramError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (kind, key) = match s.split_once(':') {
            Some((kind, key)) => (kind, Some(key)),
            None => (s, None),
        };

        let kind = match kind {
            "global" => ScopeKind::Global,
            "chat" => ScopeKind::Chat,
            "group" => ScopeKind::Group,
            "method" => ScopeKind::Method,
            other => {
                return Err(TelegramError::InvalidConfig(format!(
                    "unknown scope kind '{}'",
                    other
                )));
            }
        };

        match (kind, key) {
            (ScopeKind::Global, None) => Ok(Self::global()),
            (ScopeKind::Global, Some(_)) => Err(TelegramError::InvalidConfig(
                "the global scope takes no key".to_string(),
            )),
            (_, Some(key)) if !key.is_empty() => Ok(Self {
                kind,
                key: Some(key.to_string()),
            }),
            _ => Err(TelegramError::InvalidConfig(format!(
                "scope '{}' requires a key",
                kind
            ))),
        }
    }
}

/// How many requests a scope admits per sliding window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ScopeLimitRepr", into = "ScopeLimitRepr")]
pub struct ScopeLimit {
    window: Duration,
    max_count: u32,
}

impl ScopeLimit {
    /// Create a limit of `max_count` requests per `window`.
    ///
    /// # Panics
    ///
    /// Panics if `max_count` is zero or `window` is zero.
    pub const fn new(window: Duration, max_count: u32) -> Self {
        assert!(max_count >= 1, "scope max_count must be at least 1");
        assert!(!window.is_zero(), "scope window must be non-zero");
        Self { window, max_count }
    }

    /// Create a limit, rejecting invalid values instead of panicking.
    pub fn try_new(window: Duration, max_count: u32) -> Result<Self, TelegramError> {
        if max_count == 0 {
            return Err(TelegramError::InvalidConfig(
                "scope max_count must be at least 1".to_string(),
            ));
        }
        if window.is_zero() {
            return Err(TelegramError::InvalidConfig(
                "scope window must be non-zero".to_string(),
            ));
        }
        Ok(Self { window, max_count })
    }

    /// The sliding window duration.
    pub fn window(&self) -> Duration {
        self.window
    }

    /// Maximum requests admitted within one window.
    pub fn max_count(&self) -> u32 {
        self.max_count
    }
}

#[derive(Serialize, Deserialize)]
struct ScopeLimitRepr {
    #[serde(with = "duration_ms")]
    window_ms: Duration,
    max_count: u32,
}

impl TryFrom<ScopeLimitRepr> for ScopeLimit {
    type Error = TelegramError;

    fn try_from(repr: ScopeLimitRepr) -> Result<Self, Self::Error> {
        Self::try_new(repr.window_ms, repr.max_count)
    }
}

impl From<ScopeLimit> for ScopeLimitRepr {
    fn from(limit: ScopeLimit) -> Self {
        Self {
            window_ms: limit.window,
            max_count: limit.max_count,
        }
    }
}

/// A scope identity together with its configured limit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scope {
    /// Which bucket to count against
    pub key: ScopeKey,
    /// The bucket's limit
    pub limit: ScopeLimit,
}

impl Scope {
    /// Create a new scope.
    pub fn new(key: ScopeKey, limit: ScopeLimit) -> Self {
        Self { key, limit }
    }
}

/// Outcome of an admission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// The request was counted and may proceed.
    Admitted,
    /// The scope is full; a slot frees up after `wait`.
    Deny {
        /// Time until the oldest counted request leaves the window
        wait: Duration,
    },
}

impl Admission {
    /// Whether the request was admitted.
    pub fn is_admitted(&self) -> bool {
        matches!(self, Admission::Admitted)
    }

    /// The suggested wait in whole milliseconds, rounded up; zero if admitted.
    pub fn wait_ms(&self) -> u64 {
        match self {
            Admission::Admitted => 0,
            Admission::Deny { wait } => {
                let millis = wait.as_nanos().div_ceil(1_000_000);
                u64::try_from(millis).unwrap_or(u64::MAX)
            }
        }
    }
}
