use crate::config::LlmConfig;
use crate::error::VoiceError;
use recall_types::ChatMessage;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
}

#[derive(Serialize)]
struct WireMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

#[derive(Deserialize)]
struct CompletionChoice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Minimal client for an OpenAI-compatible chat completions endpoint.
///
/// Used by sessions that drive the language model themselves instead of
/// through a media engine.
#[derive(Debug, Clone)]
pub struct ChatClient {
    base_url: String,
    model: String,
    api_key: String,
    http: reqwest::Client,
}

impl ChatClient {
    pub fn new(config: &LlmConfig) -> Result<Self, VoiceError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| VoiceError::Config(format!("failed to build LLM client: {}", e)))?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key: config.api_key.clone(),
            http,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Generates the next agent reply.
    ///
    /// `instructions` is the agent's system prompt; `reply_instructions`, when
    /// given, steers only this reply (e.g. a greeting).
    pub async fn complete(
        &self,
        instructions: &str,
        history: &[ChatMessage],
        reply_instructions: Option<&str>,
    ) -> Result<String, VoiceError> {
        let mut messages = Vec::with_capacity(history.len() + 2);
        messages.push(WireMessage {
            role: "system",
            content: instructions,
        });
        messages.extend(history.iter().map(|m| WireMessage {
            role: m.role.as_str(),
            content: &m.content,
        }));
        if let Some(extra) = reply_instructions {
            messages.push(WireMessage {
                role: "system",
                content: extra,
            });
        }

        let body = CompletionRequest {
            model: &self.model,
            messages,
        };

        let mut request = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .json(&body);
        if !self.api_key.is_empty() {
            request = request.bearer_auth(&self.api_key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| VoiceError::Llm(format!("request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(VoiceError::Llm(format!("API error {}: {}", status, text)));
        }

        let completion: CompletionResponse = response
            .json()
            .await
            .map_err(|e| VoiceError::Llm(format!("failed to parse response: {}", e)))?;

        completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .filter(|content| !content.is_empty())
            .ok_or_else(|| VoiceError::Llm("response contained no reply".to_string()))
    }
}
