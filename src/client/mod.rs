//! Request orchestration: rate limiting and retries around every call.

mod handler;
mod transport;

pub use handler::{RequestHandler, RequestHandlerBuilder, RequestOptions};
pub use transport::{BotClient, Transport};
