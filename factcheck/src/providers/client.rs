//! Structured-output client for OpenAI-compatible chat completion APIs
//!
//! Each call sends the skill instructions as the system message and the JSON
//! payload as the user message, asks for a JSON object back and parses the
//! first choice into the requested type. Research that needs live web
//! evidence goes through the Responses API with the hosted web search tool
//! instead.

use anyhow::{anyhow, bail, Context, Result};
use reqwest::{header, Client};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

use super::profile::ResolvedInference;
use crate::config::SearchContextSize;
use crate::util::parse_json;

const OUTPUT_REQUIREMENTS: &str = "Output requirements:
- Return only valid JSON.
- Do not include markdown fences.
- Return a single JSON object shaped as described in the instructions.";

pub struct StructuredClient {
    http: Client,
    base_url: String,
    api_key: String,
    model: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    response_format: ResponseFormat,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: &'static str,
}

#[derive(Debug, Serialize)]
struct WebSearchRequest<'a> {
    model: &'a str,
    instructions: &'a str,
    input: &'a str,
    tools: Vec<WebSearchTool>,
    tool_choice: &'static str,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct WebSearchTool {
    #[serde(rename = "type")]
    tool_type: &'static str,
    search_context_size: &'static str,
}

#[derive(Debug, Deserialize)]
struct ResponsesResponse {
    #[serde(default)]
    output: Vec<OutputItem>,
}

#[derive(Debug, Deserialize)]
struct OutputItem {
    #[serde(rename = "type")]
    item_type: String,
    #[serde(default)]
    content: Vec<OutputContent>,
}

#[derive(Debug, Deserialize)]
struct OutputContent {
    #[serde(rename = "type")]
    content_type: String,
    #[serde(default)]
    text: Option<String>,
}

impl ResponsesResponse {
    /// Concatenated text of every assistant message, skipping tool calls
    fn output_text(&self) -> String {
        self.output
            .iter()
            .filter(|item| item.item_type == "message")
            .flat_map(|item| item.content.iter())
            .filter(|content| content.content_type == "output_text")
            .filter_map(|content| content.text.as_deref())
            .collect::<Vec<_>>()
            .join("")
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: MessageResponse,
}

#[derive(Debug, Deserialize)]
struct MessageResponse {
    content: Option<String>,
}

impl StructuredClient {
    pub fn new(inference: &ResolvedInference) -> Result<Self> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );

        let http = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(inference.request_timeout_seconds.max(1)))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            http,
            base_url: inference.base_url.clone(),
            api_key: inference.api_key.clone(),
            model: inference.model.clone(),
        })
    }

    fn chat_completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    fn responses_url(&self) -> String {
        format!("{}/responses", self.base_url)
    }

    /// Run one structured call and deserialize the answer into `T`
    pub async fn generate<T: DeserializeOwned>(&self, instructions: &str, payload: &Value) -> Result<T> {
        let user_message = build_user_message(payload)?;
        let text = self.complete(instructions, &user_message).await?;
        parse_json(&text).with_context(|| format!("Unusable response from model {}", self.model))
    }

    /// Like [`generate`](Self::generate), but the model must consult the
    /// hosted web search tool before answering
    pub async fn generate_with_web_search<T: DeserializeOwned>(
        &self,
        instructions: &str,
        payload: &Value,
        search_context_size: SearchContextSize,
    ) -> Result<T> {
        let user_message = build_user_message(payload)?;
        let request = WebSearchRequest {
            model: &self.model,
            instructions,
            input: &user_message,
            tools: vec![WebSearchTool {
                tool_type: "web_search_preview",
                search_context_size: search_context_size.as_str(),
            }],
            tool_choice: "required",
            temperature: 0.1,
        };

        tracing::debug!(model = %self.model, url = %self.responses_url(), "web search request");

        let response = self
            .http
            .post(self.responses_url())
            .header(header::AUTHORIZATION, format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await
            .context("Web search request failed")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!("Web search returned HTTP {}: {}", status, body);
        }

        let decoded: ResponsesResponse = response
            .json()
            .await
            .context("Failed to decode web search response")?;

        let text = decoded.output_text();
        if text.trim().is_empty() {
            bail!("Model {} returned no text content", self.model);
        }
        parse_json(&text).with_context(|| format!("Unusable response from model {}", self.model))
    }

    /// Raw text of the first choice
    pub async fn complete(&self, system: &str, user: &str) -> Result<String> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
            temperature: 0.1,
            response_format: ResponseFormat {
                format_type: "json_object",
            },
        };

        tracing::debug!(model = %self.model, url = %self.chat_completions_url(), "chat completion request");

        let response = self
            .http
            .post(self.chat_completions_url())
            .header(header::AUTHORIZATION, format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await
            .context("Chat completion request failed")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!("Chat completion returned HTTP {}: {}", status, body);
        }

        let chat: ChatResponse = response
            .json()
            .await
            .context("Failed to decode chat completion response")?;

        let content = chat
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| anyhow!("No choices in chat completion response"))?;

        if content.trim().is_empty() {
            bail!("Model {} returned no text content", self.model);
        }
        Ok(content)
    }
}

/// User message carrying the payload and the output contract
pub fn build_user_message(payload: &Value) -> Result<String> {
    let payload = serde_json::to_string_pretty(payload).context("Failed to serialize payload")?;
    Ok(format!(
        "Input payload (JSON):\n{}\n\n{}",
        payload, OUTPUT_REQUIREMENTS
    ))
}
