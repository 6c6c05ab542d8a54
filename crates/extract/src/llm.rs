use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::schema::ChatTurn;

/// Client for an OpenAI-style chat-completion endpoint. The reasoner models
/// additionally return a reasoning trace next to the answer content.
#[derive(Clone)]
pub struct ChatClient {
    base_url: String,
    api_key: String,
    model: String,
    temperature: f64,
    max_tokens: u32,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatTurn],
    max_tokens: u32,
    temperature: f64,
    stream: bool,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    content: String,
    reasoning_content: Option<String>,
}

/// Generated text plus the optional reasoning trace.
#[derive(Debug, Clone)]
pub struct ChatOutcome {
    pub content: String,
    pub reasoning: Option<String>,
}

impl ChatClient {
    pub fn new(base_url: String, api_key: String, model: String) -> Self {
        Self {
            base_url,
            api_key,
            model,
            temperature: 0.01,
            max_tokens: 8192,
            client: reqwest::Client::new(),
        }
    }

    pub fn with_sampling(mut self, temperature: f64, max_tokens: u32) -> Self {
        self.temperature = temperature;
        self.max_tokens = max_tokens;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub async fn complete(&self, messages: &[ChatTurn]) -> Result<ChatOutcome> {
        let url = format!("{}/chat/completions", self.base_url);

        let request = ChatRequest {
            model: &self.model,
            messages,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            stream: false,
        };

        let response = self.client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .context("Failed to send chat completion request")?;

        if !response.status().is_success() {
            anyhow::bail!("Chat completion request failed: {}", response.status());
        }

        let chat_response: ChatResponse = response
            .json()
            .await
            .context("Failed to parse chat completion response")?;

        let choice = chat_response
            .choices
            .into_iter()
            .next()
            .context("Chat completion response has no choices")?;

        Ok(ChatOutcome {
            content: choice.message.content,
            reasoning: choice.message.reasoning_content,
        })
    }
}
