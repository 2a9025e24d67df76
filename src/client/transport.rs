//! Transport seam and the rate-limited bot client built on it.
//!
//! The crate does not ship an HTTP stack. Implement [`Transport`] over your
//! HTTP client of choice and wrap it in a [`BotClient`] to route every call
//! through rate limiting and retries.
//!
//! # Example
//!
//! ```rust
//! use std::future::Future;
//! use serde_json::{Value, json};
//! use telegram_api_client::client::{BotClient, Transport};
//! use telegram_api_client::error::RawError;
//! use telegram_api_client::types::MethodName;
//!
//! struct Echo;
//!
//! impl Transport for Echo {
//!     fn call(
//!         &self,
//!         _method: &MethodName,
//!         params: &Value,
//!     ) -> impl Future<Output = Result<Value, RawError>> + Send {
//!         let params = params.clone();
//!         async move { Ok(params) }
//!     }
//! }
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let client = BotClient::new(Echo);
//! let sent = client
//!     .call(MethodName::SEND_MESSAGE, &json!({ "chat_id": 1, "text": "hi" }))
//!     .await
//!     .unwrap();
//! assert_eq!(sent["text"], "hi");
//! # }
//! ```

use std::future::Future;

use serde_json::Value;

use crate::client::{RequestHandler, RequestOptions};
use crate::error::RawError;
use crate::types::MethodName;

/// Trait for performing a single Bot API call.
///
/// Implementations send `params` to `method` and return the `result` field
/// of a successful response, or the failure as a [`RawError`]. Use
/// [`RawError::from_response_body`] for unsuccessful response bodies.
pub trait Transport: Send + Sync {
    /// Perform one call, without retries or rate limiting.
    fn call(
        &self,
        method: &MethodName,
        params: &Value,
    ) -> impl Future<Output = Result<Value, RawError>> + Send;
}

/// A [`Transport`] wrapped with rate limiting and retries.
#[derive(Debug, Clone)]
pub struct BotClient<T> {
    transport: T,
    handler: RequestHandler,
}

impl<T: Transport> BotClient<T> {
    /// Wrap a transport with the default handler.
    pub fn new(transport: T) -> Self {
        Self::with_handler(transport, RequestHandler::default())
    }

    /// Wrap a transport with a configured handler.
    pub fn with_handler(transport: T, handler: RequestHandler) -> Self {
        Self { transport, handler }
    }

    /// Get a reference to the inner transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Get a reference to the request handler.
    pub fn handler(&self) -> &RequestHandler {
        &self.handler
    }

    /// Call a method with default options.
    pub async fn call(&self, method: impl Into<MethodName>, params: &Value) -> crate::Result<Value> {
        self.call_with(method, params, &RequestOptions::default())
            .await
    }

    /// Call a method with per-call options.
    pub async fn call_with(
        &self,
        method: impl Into<MethodName>,
        params: &Value,
        opts: &RequestOptions,
    ) -> crate::Result<Value> {
        let method = method.into();
        let transport = &self.transport;
        let name = &method;

        self.handler
            .request_with_handling(
                method.clone(),
                params,
                move || transport.call(name, params),
                opts,
            )
            .await
    }
}
