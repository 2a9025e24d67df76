//! Classification of Telegram failures into retryable and fatal.
//!
//! Rules are checked in order and the first match wins:
//!
//! | Condition                                        | Verdict                  |
//! |--------------------------------------------------|--------------------------|
//! | description has `timeout`/`connection`/`network` | retry after 1s           |
//! | `Too Many Requests`, or code 420/429             | retry after `retry after N` seconds, else 5s |
//! | `Bad Gateway`                                    | retry after 2s           |
//! | `Service Unavailable`                            | retry after 3s           |
//! | `Gateway Timeout`                                | retry after 4s           |
//! | code 500..=599                                   | retry after 2s           |
//! | `bot was blocked`                                | [`TelegramError::BotBlocked`] |
//! | `bot was kicked`                                 | [`TelegramError::BotKicked`] |
//! | `chat not found`                                 | [`TelegramError::ChatNotFound`] for text, original error if structured |
//! | `message to forward not found`                   | original error           |
//! | `message is too long`                            | [`TelegramError::MessageTooLong`] |
//! | anything else                                    | original error           |

use std::time::Duration;

use crate::error::{RawError, TelegramError, error_descriptions as desc};

/// Delay before retrying after a network-level failure.
pub const NETWORK_DELAY: Duration = Duration::from_millis(1000);
/// Delay for flood-control errors without a `retry after` hint.
pub const FLOOD_DEFAULT_DELAY: Duration = Duration::from_millis(5000);
/// Delay after `Bad Gateway` and generic 5xx errors.
pub const BAD_GATEWAY_DELAY: Duration = Duration::from_millis(2000);
/// Delay after `Service Unavailable`.
pub const SERVICE_UNAVAILABLE_DELAY: Duration = Duration::from_millis(3000);
/// Delay after `Gateway Timeout`.
pub const GATEWAY_TIMEOUT_DELAY: Duration = Duration::from_millis(4000);

/// Verdict for one failure.
#[derive(Debug, Clone, PartialEq)]
pub enum ErrorClass {
    /// Worth retrying, no sooner than `delay`.
    Retryable {
        /// Minimum wait before the next attempt
        delay: Duration,
    },
    /// Retrying cannot help; surface this error.
    Fatal(TelegramError),
}

impl ErrorClass {
    fn retry_after(delay: Duration) -> Self {
        ErrorClass::Retryable { delay }
    }
}

/// Classify a raw failure.
///
/// Pure and total: the verdict depends only on `error`.
pub fn classify(error: &RawError) -> ErrorClass {
    let description = error.description();

    if [desc::TIMEOUT, desc::CONNECTION, desc::NETWORK]
        .iter()
        .any(|fragment| description.contains(*fragment))
    {
        return ErrorClass::retry_after(NETWORK_DELAY);
    }

    if error.is_rate_limit() {
        return ErrorClass::retry_after(flood_delay(error));
    }

    if description.contains(desc::BAD_GATEWAY) {
        return ErrorClass::retry_after(BAD_GATEWAY_DELAY);
    }
    if description.contains(desc::SERVICE_UNAVAILABLE) {
        return ErrorClass::retry_after(SERVICE_UNAVAILABLE_DELAY);
    }
    if description.contains(desc::GATEWAY_TIMEOUT) {
        return ErrorClass::retry_after(GATEWAY_TIMEOUT_DELAY);
    }
    if error.is_server_error() {
        return ErrorClass::retry_after(BAD_GATEWAY_DELAY);
    }

    let fatal = if error.is_bot_blocked() {
        TelegramError::BotBlocked
    } else if error.is_bot_kicked() {
        TelegramError::BotKicked
    } else if error.is_chat_not_found() {
        if error.is_structured() {
            TelegramError::Api(error.clone())
        } else {
            TelegramError::ChatNotFound
        }
    } else if description.contains(desc::MESSAGE_TO_FORWARD_NOT_FOUND) {
        TelegramError::Api(error.clone())
    } else if description.contains(desc::MESSAGE_TOO_LONG) {
        TelegramError::MessageTooLong
    } else {
        TelegramError::Api(error.clone())
    };
    ErrorClass::Fatal(fatal)
}

/// Delay for a flood-control error.
///
/// Prefers the `retry after N` hint in the description, then the envelope's
/// `parameters.retry_after`.
fn flood_delay(error: &RawError) -> Duration {
    let hinted = parse_retry_after(error.description()).or(match error {
        RawError::Structured(api) => api.retry_after(),
        RawError::Text(_) => None,
    });
    hinted.map_or(FLOOD_DEFAULT_DELAY, Duration::from_secs)
}

/// Extract `N` from the last `retry after N` in a description.
fn parse_retry_after(description: &str) -> Option<u64> {
    let (_, tail) = description.rsplit_once(desc::RETRY_AFTER)?;
    let tail = tail.trim_start();
    let end = tail
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(tail.len());
    tail[..end].parse().ok()
}
