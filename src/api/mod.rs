//! OpenAI-compatible wire types and the two request operations the client
//! performs: listing models and requesting a chat completion.

use serde::{Deserialize, Serialize};

pub mod chat;
pub mod client;
pub mod error;
pub mod models;

pub use client::{ApiBackend, Endpoint, HttpBackend};
pub use error::{ApiError, ErrorKind};

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModelInfo {
    pub id: String,
}

impl ModelInfo {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

impl From<&crate::core::message::Message> for ChatMessage {
    fn from(message: &crate::core::message::Message) -> Self {
        Self {
            role: message.role.as_str().to_string(),
            content: message.content.clone(),
        }
    }
}
