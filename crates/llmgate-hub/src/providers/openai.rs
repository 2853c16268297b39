//! OpenAI-compatible upstream — OpenRouter by default, but any API that follows
//! the chat completions format works:
//! - OpenRouter (openrouter.ai)
//! - OpenAI (api.openai.com)
//! - Ollama, LM Studio, Groq, Together, ...

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use llmgate_core::config::GatewayConfig;
use llmgate_core::error::Result;
use llmgate_core::outcome::UpstreamReply;
use llmgate_core::provider::{CompletionCall, UpstreamClient};

/// reqwest-backed [`UpstreamClient`]. One POST per call, no retries.
pub struct HttpUpstream {
    client: Client,
    api_key: String,
    api_url: String,
}

impl HttpUpstream {
    pub fn new(api_key: &str, api_base: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(client, api_key, api_base))
    }

    /// Build from the resolved gateway configuration.
    pub fn from_config(config: &GatewayConfig) -> Result<Self> {
        Self::new(&config.api_key, &config.base_url, config.request_timeout)
    }

    pub fn with_client(client: Client, api_key: &str, api_base: &str) -> Self {
        let api_url = format!("{}/chat/completions", api_base.trim_end_matches('/'));
        Self {
            client,
            api_key: api_key.to_string(),
            api_url,
        }
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }
}

#[async_trait]
impl UpstreamClient for HttpUpstream {
    async fn chat_completion(&self, call: &CompletionCall) -> UpstreamReply {
        debug!("POST {} model={}", self.api_url, call.model);

        let resp = match self
            .client
            .post(&self.api_url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(call)
            .send()
            .await
        {
            Ok(resp) => resp,
            Err(e) => return transport_failure(e),
        };

        let status = resp.status();
        let body = match resp.text().await {
            Ok(body) => body,
            Err(e) => return transport_failure(e),
        };

        debug!("API response status: {}, body length: {}", status, body.len());

        UpstreamReply::Response {
            status: status.as_u16(),
            body,
        }
    }
}

fn transport_failure(e: reqwest::Error) -> UpstreamReply {
    if e.is_timeout() {
        UpstreamReply::Timeout
    } else {
        UpstreamReply::Transport(e.to_string())
    }
}
