//! One-shot notifications shown on the next rendered page.
//!
//! Messages live client-side in the `ingresso_messages` cookie as base64url
//! encoded JSON. A response that redirects stores the unread messages plus the
//! ones added while handling the request; a response that renders a page
//! consumes all of them and clears the cookie.

use crate::sessions::cookie_value;
use axum::http::{HeaderMap, HeaderValue, header::InvalidHeaderValue};
use base64ct::{Base64UrlUnpadded, Encoding};
use serde::{Deserialize, Serialize};
use tracing::debug;
use utoipa::ToSchema;

pub const MESSAGES_COOKIE_NAME: &str = "ingresso_messages";

#[derive(ToSchema, Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Debug,
    Info,
    Success,
    Warning,
    Error,
}

#[derive(ToSchema, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub level: Level,
    pub message: String,
}

/// Messages pending for the current client.
#[derive(Debug, Default)]
pub struct Messages {
    pending: Vec<Message>,
    consumed: bool,
}

impl Messages {
    /// Load unread messages from the request cookies. A cookie that does not
    /// decode is dropped.
    #[must_use]
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let pending = cookie_value(headers, MESSAGES_COOKIE_NAME)
            .filter(|value| !value.is_empty())
            .and_then(|value| decode(&value))
            .unwrap_or_default();
        Self {
            pending,
            consumed: false,
        }
    }

    pub fn add(&mut self, level: Level, message: impl Into<String>) {
        self.pending.push(Message {
            level,
            message: message.into(),
        });
    }

    pub fn info(&mut self, message: impl Into<String>) {
        self.add(Level::Info, message);
    }

    pub fn success(&mut self, message: impl Into<String>) {
        self.add(Level::Success, message);
    }

    /// Take every pending message for rendering.
    pub fn take(&mut self) -> Vec<Message> {
        self.consumed = true;
        std::mem::take(&mut self.pending)
    }

    /// The `Set-Cookie` value that persists the current state, or `None` when
    /// nothing was read or written during the request.
    ///
    /// # Errors
    /// Returns an error if the cookie cannot be encoded as a header value.
    pub fn cookie(&self, secure: bool) -> Result<Option<HeaderValue>, InvalidHeaderValue> {
        let value = if self.pending.is_empty() {
            if !self.consumed {
                return Ok(None);
            }
            format!("{MESSAGES_COOKIE_NAME}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0")
        } else {
            format!(
                "{MESSAGES_COOKIE_NAME}={}; Path=/; HttpOnly; SameSite=Lax",
                encode(&self.pending)
            )
        };
        let value = if secure {
            format!("{value}; Secure")
        } else {
            value
        };
        HeaderValue::from_str(&value).map(Some)
    }
}

fn encode(messages: &[Message]) -> String {
    // Serializing a Vec of plain structs cannot fail.
    let json = serde_json::to_vec(messages).unwrap_or_default();
    Base64UrlUnpadded::encode_string(&json)
}

fn decode(value: &str) -> Option<Vec<Message>> {
    let bytes = Base64UrlUnpadded::decode_vec(value).ok()?;
    match serde_json::from_slice(&bytes) {
        Ok(messages) => Some(messages),
        Err(err) => {
            debug!("Dropping undecodable messages cookie: {err}");
            None
        }
    }
}
