//! Message types — the conversation forwarded to the upstream provider.

use std::num::{NonZeroU32, NonZeroU64};

use serde::{Deserialize, Serialize};

/// Role in a conversation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::System => write!(f, "system"),
            Self::User => write!(f, "user"),
            Self::Assistant => write!(f, "assistant"),
        }
    }
}

/// A single message in a conversation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: &str) -> Self {
        Self {
            role: Role::System,
            content: content.to_string(),
        }
    }

    pub fn user(content: &str) -> Self {
        Self {
            role: Role::User,
            content: content.to_string(),
        }
    }

    pub fn assistant(content: &str) -> Self {
        Self {
            role: Role::Assistant,
            content: content.to_string(),
        }
    }
}

/// Inbound body of the `generate` operation, as the caller sends it.
///
/// `max_tokens` must be a positive integer; zero or negative values are
/// rejected while deserializing. Values above the ceiling, however large,
/// are clamped later by the normalizer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateRequest {
    pub messages: Vec<ChatMessage>,
    pub max_tokens: NonZeroU64,
}

/// Upstream-agnostic generation request produced by the normalizer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    messages: Vec<ChatMessage>,
    max_tokens: NonZeroU32,
}

impl GenerationRequest {
    pub fn new(messages: Vec<ChatMessage>, max_tokens: NonZeroU32) -> Self {
        Self {
            messages,
            max_tokens,
        }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Output-token budget after clamping to the configured ceiling.
    pub fn max_tokens(&self) -> u32 {
        self.max_tokens.get()
    }
}
