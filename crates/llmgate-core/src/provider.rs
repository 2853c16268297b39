//! Upstream client trait — the single capability the orchestrator needs from a provider.

use async_trait::async_trait;
use serde::Serialize;

use crate::message::ChatMessage;
use crate::outcome::UpstreamReply;

/// Body of one outbound chat-completion call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompletionCall {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub max_tokens: u32,
}

/// Upstream chat-completion capability.
///
/// Implementations make exactly one network attempt per call and report
/// what they observed; they never retry and never classify.
///
/// # Example
///
/// ```rust,ignore
/// struct Canned;
///
/// #[async_trait]
/// impl UpstreamClient for Canned {
///     async fn chat_completion(&self, call: &CompletionCall) -> UpstreamReply {
///         UpstreamReply::Response { status: 200, body: canned_body(&call.model) }
///     }
/// }
/// ```
#[async_trait]
pub trait UpstreamClient: Send + Sync {
    async fn chat_completion(&self, call: &CompletionCall) -> UpstreamReply;
}

#[async_trait]
impl<T: UpstreamClient + ?Sized> UpstreamClient for std::sync::Arc<T> {
    async fn chat_completion(&self, call: &CompletionCall) -> UpstreamReply {
        (**self).chat_completion(call).await
    }
}

#[async_trait]
impl<T: UpstreamClient + ?Sized> UpstreamClient for Box<T> {
    async fn chat_completion(&self, call: &CompletionCall) -> UpstreamReply {
        (**self).chat_completion(call).await
    }
}
