//! Common types used across the Telegram client library.

pub mod common;
pub mod serde_helpers;

pub use common::*;
