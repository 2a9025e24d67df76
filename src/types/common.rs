//! Common domain types for the Telegram Bot API.

use std::borrow::Cow;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Identifier of a target chat.
///
/// Telegram accepts either a numeric chat id or the `@username` of a public
/// channel or supergroup wherever a `chat_id` parameter is expected.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChatId {
    /// Numeric chat identifier
    Id(i64),
    /// `@channelusername`
    Username(String),
}

impl ChatId {
    /// Extract a chat id from a JSON parameter value.
    ///
    /// String values are kept verbatim, numeric strings included.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n.as_i64().map(Self::Id),
            Value::String(s) if !s.is_empty() => Some(Self::Username(s.clone())),
            _ => None,
        }
    }
}

impl std::fmt::Display for ChatId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChatId::Id(id) => write!(f, "{}", id),
            ChatId::Username(name) => f.write_str(name),
        }
    }
}

impl From<i64> for ChatId {
    fn from(id: i64) -> Self {
        Self::Id(id)
    }
}

impl From<i32> for ChatId {
    fn from(id: i32) -> Self {
        Self::Id(id.into())
    }
}

impl From<&str> for ChatId {
    fn from(name: &str) -> Self {
        Self::Username(name.to_string())
    }
}

impl From<String> for ChatId {
    fn from(name: String) -> Self {
        Self::Username(name)
    }
}

/// Name of a Bot API method, such as `sendMessage`.
///
/// Call sites pass the method name explicitly; the common ones are available
/// as associated constants.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MethodName(Cow<'static, str>);

impl MethodName {
    pub const SEND_MESSAGE: Self = Self::from_static("sendMessage");
    pub const FORWARD_MESSAGE: Self = Self::from_static("forwardMessage");
    pub const COPY_MESSAGE: Self = Self::from_static("copyMessage");
    pub const SEND_PHOTO: Self = Self::from_static("sendPhoto");
    pub const SEND_DOCUMENT: Self = Self::from_static("sendDocument");
    pub const SEND_VIDEO: Self = Self::from_static("sendVideo");
    pub const SEND_MEDIA_GROUP: Self = Self::from_static("sendMediaGroup");
    pub const SEND_POLL: Self = Self::from_static("sendPoll");
    pub const EDIT_MESSAGE_TEXT: Self = Self::from_static("editMessageText");
    pub const DELETE_MESSAGE: Self = Self::from_static("deleteMessage");
    pub const ANSWER_CALLBACK_QUERY: Self = Self::from_static("answerCallbackQuery");
    pub const BAN_CHAT_MEMBER: Self = Self::from_static("banChatMember");
    pub const GET_UPDATES: Self = Self::from_static("getUpdates");
    pub const GET_ME: Self = Self::from_static("getMe");

    /// Create a method name from a static string.
    pub const fn from_static(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }

    /// The method name as sent to Telegram.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for MethodName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&'static str> for MethodName {
    fn from(name: &'static str) -> Self {
        Self::from_static(name)
    }
}

impl From<String> for MethodName {
    fn from(name: String) -> Self {
        Self(Cow::Owned(name))
    }
}

impl AsRef<str> for MethodName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// What the rate limiter needs to know about an outgoing request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestDescriptor {
    /// The Bot API method being called.
    pub method: MethodName,
    /// The target chat, if the method addresses one.
    pub chat_id: Option<ChatId>,
}

impl RequestDescriptor {
    /// Create a descriptor for a method call without a target chat.
    pub fn new(method: impl Into<MethodName>) -> Self {
        Self {
            method: method.into(),
            chat_id: None,
        }
    }

    /// Set the target chat.
    pub fn chat(mut self, chat_id: impl Into<ChatId>) -> Self {
        self.chat_id = Some(chat_id.into());
        self
    }

    /// Build a descriptor from a method name and its parameter bag.
    ///
    /// The target chat is read from the `chat_id` parameter when present.
    pub fn from_params(method: impl Into<MethodName>, params: &Value) -> Self {
        Self {
            method: method.into(),
            chat_id: params.get("chat_id").and_then(ChatId::from_value),
        }
    }
}
