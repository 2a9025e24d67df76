//! # Telegram Client
//!
//! Rate limiting and retry coordination for Telegram Bot API clients.
//!
//! ## Features
//!
//! - Sliding window rate limits per bot, per method, per chat and per group
//! - Classification of Telegram errors into retryable and fatal
//! - Exponential backoff with injectable jitter
//! - A single orchestration entry point every API call goes through
//! - Explicit, shareable limiter state; no process-wide globals
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use serde_json::json;
//! use telegram_api_client::client::{RequestHandler, RequestOptions};
//! use telegram_api_client::error::RawError;
//! use telegram_api_client::types::MethodName;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let handler = RequestHandler::builder().build()?;
//!     let params = json!({ "chat_id": 123456789, "text": "Hello" });
//!
//!     let message = handler
//!         .request_with_handling(
//!             MethodName::SEND_MESSAGE,
//!             &params,
//!             // Perform the HTTP call here.
//!             || async { Ok::<_, RawError>(json!({ "message_id": 1 })) },
//!             &RequestOptions::default(),
//!         )
//!         .await?;
//!     println!("Sent: {}", message);
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod error;
pub mod rate_limit;
pub mod retry;
pub mod types;

// Re-export commonly used types at crate root
pub use client::{BotClient, RequestHandler, RequestOptions, Transport};
pub use error::{ApiError, RawError, TelegramError};
pub use types::common::{ChatId, MethodName, RequestDescriptor};

/// Result type alias using TelegramError
pub type Result<T> = std::result::Result<T, TelegramError>;
