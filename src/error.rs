//! Error types for the Telegram client library.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The main error type returned by rate-limited, retried Telegram calls.
///
/// Some fatal failures are normalized to a short reason (`BotBlocked`,
/// `ChatNotFound`, ...). Others keep the raw error exactly as the transport
/// produced it in [`TelegramError::Api`], so callers can keep matching on
/// the original shape.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TelegramError {
    /// The user blocked the bot.
    #[error("Forbidden: bot was blocked by the user")]
    BotBlocked,

    /// The bot was removed from the chat.
    #[error("Forbidden: bot was kicked from the chat")]
    BotKicked,

    /// The target chat does not exist or is not visible to the bot.
    #[error("Bad Request: chat not found")]
    ChatNotFound,

    /// The message text exceeds Telegram's length limit.
    #[error("Bad Request: message is too long")]
    MessageTooLong,

    /// The raw failure, unchanged.
    ///
    /// Used for unrecognized fatal errors, for shape-preserving fatal errors,
    /// when retries are exhausted, and when retries are skipped.
    #[error("Telegram API error: {0}")]
    Api(RawError),

    /// Invalid rate limit or retry configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// A failure as reported by the transport layer.
///
/// Transports either produce free text (connection failures, timeouts) or the
/// structured error envelope Telegram returns in the response body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawError {
    /// Free-text error message.
    Text(String),
    /// Telegram's `{ok: false, error_code, description}` envelope.
    Structured(ApiError),
}

impl RawError {
    /// Create a free-text error.
    pub fn text(message: impl Into<String>) -> Self {
        Self::Text(message.into())
    }

    /// Create a structured error from an error code and description.
    pub fn api(error_code: i64, description: impl Into<String>) -> Self {
        Self::Structured(ApiError::new(error_code, description))
    }

    /// Parse a Telegram response body into a raw error.
    ///
    /// Bodies that are not a valid error envelope are kept verbatim as text.
    pub fn from_response_body(body: &str) -> Self {
        match serde_json::from_str::<ApiError>(body) {
            Ok(error) => Self::Structured(error),
            Err(_) => Self::Text(body.to_string()),
        }
    }

    /// The human-readable description, whatever the shape.
    pub fn description(&self) -> &str {
        match self {
            Self::Text(message) => message,
            Self::Structured(error) => &error.description,
        }
    }

    /// The numeric error code, if the error is structured and carries one.
    pub fn error_code(&self) -> Option<i64> {
        match self {
            Self::Text(_) => None,
            Self::Structured(error) => error.error_code,
        }
    }

    /// Whether this error came from a structured envelope.
    pub fn is_structured(&self) -> bool {
        matches!(self, Self::Structured(_))
    }

    /// Check if this is a flood-control error, by description or code.
    pub fn is_rate_limit(&self) -> bool {
        self.description().contains(error_descriptions::TOO_MANY_REQUESTS)
            || matches!(self, Self::Structured(error) if error.is_rate_limit())
    }

    /// Check if this is a structured 5xx error.
    pub fn is_server_error(&self) -> bool {
        matches!(self, Self::Structured(error) if error.is_server_error())
    }

    /// Check if the user blocked the bot.
    pub fn is_bot_blocked(&self) -> bool {
        self.description().contains(error_descriptions::BOT_BLOCKED)
    }

    /// Check if the bot was kicked from the chat.
    pub fn is_bot_kicked(&self) -> bool {
        self.description().contains(error_descriptions::BOT_KICKED)
    }

    /// Check if the chat does not exist.
    pub fn is_chat_not_found(&self) -> bool {
        self.description().contains(error_descriptions::CHAT_NOT_FOUND)
    }
}

impl std::fmt::Display for RawError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text(message) => f.write_str(message),
            Self::Structured(error) => error.fmt(f),
        }
    }
}

impl From<ApiError> for RawError {
    fn from(error: ApiError) -> Self {
        Self::Structured(error)
    }
}

impl From<String> for RawError {
    fn from(message: String) -> Self {
        Self::Text(message)
    }
}

impl From<&str> for RawError {
    fn from(message: &str) -> Self {
        Self::Text(message.to_string())
    }
}

/// Telegram API error envelope.
///
/// This is the body Telegram returns for any unsuccessful request, e.g.
/// `{"ok":false,"error_code":429,"description":"Too Many Requests: retry after 5","parameters":{"retry_after":5}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiError {
    /// Always `false` for errors.
    #[serde(default)]
    pub ok: bool,
    /// HTTP-like error code (400, 403, 429, ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_code: Option<i64>,
    /// Human-readable error message
    pub description: String,
    /// Extra hints for automatic handling
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<ResponseParameters>,
}

/// Optional `parameters` object attached to some error envelopes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseParameters {
    /// Seconds to wait before repeating a flood-limited request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_after: Option<u64>,
    /// The group was migrated to a supergroup with this identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub migrate_to_chat_id: Option<i64>,
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.error_code {
            Some(code) => write!(f, "{}: {}", code, self.description),
            None => f.write_str(&self.description),
        }
    }
}

impl ApiError {
    /// Create a new API error from code and description.
    pub fn new(error_code: i64, description: impl Into<String>) -> Self {
        Self {
            ok: false,
            error_code: Some(error_code),
            description: description.into(),
            parameters: None,
        }
    }

    /// Attach a `retry_after` hint in seconds.
    pub fn with_retry_after(mut self, seconds: u64) -> Self {
        self.parameters
            .get_or_insert_with(ResponseParameters::default)
            .retry_after = Some(seconds);
        self
    }

    /// The `parameters.retry_after` hint, if present.
    pub fn retry_after(&self) -> Option<u64> {
        self.parameters.as_ref().and_then(|p| p.retry_after)
    }

    /// Check if this is a flood-control error (420 or 429).
    pub fn is_rate_limit(&self) -> bool {
        matches!(self.error_code, Some(420 | 429))
    }

    /// Check if this is a server-side 5xx error.
    pub fn is_server_error(&self) -> bool {
        matches!(self.error_code, Some(500..=599))
    }

    /// The supergroup a migrated group moved to, if reported.
    pub fn migrate_to_chat_id(&self) -> Option<i64> {
        self.parameters.as_ref().and_then(|p| p.migrate_to_chat_id)
    }
}

/// Description fragments Telegram uses for errors with special handling.
///
/// Matching is case-sensitive substring matching against `description`.
pub mod error_descriptions {
    /// Network errors
    pub const TIMEOUT: &str = "timeout";
    pub const CONNECTION: &str = "connection";
    pub const NETWORK: &str = "network";

    /// Flood control
    pub const TOO_MANY_REQUESTS: &str = "Too Many Requests";
    pub const RETRY_AFTER: &str = "retry after";

    /// Upstream failures
    pub const BAD_GATEWAY: &str = "Bad Gateway";
    pub const SERVICE_UNAVAILABLE: &str = "Service Unavailable";
    pub const GATEWAY_TIMEOUT: &str = "Gateway Timeout";

    /// Permission and state errors
    pub const BOT_BLOCKED: &str = "bot was blocked";
    pub const BOT_KICKED: &str = "bot was kicked";
    pub const CHAT_NOT_FOUND: &str = "chat not found";
    pub const MESSAGE_TO_FORWARD_NOT_FOUND: &str = "message to forward not found";
    pub const MESSAGE_TOO_LONG: &str = "message is too long";
}
