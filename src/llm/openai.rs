use crate::llm::types::{ChatMessage, ChatRequest, ResponseFormat, StreamChunk};
use crate::llm::{ChatCompletion, LlmError};
use eventsource_stream::Eventsource;
use futures::stream::StreamExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::pin::Pin;
use tokio_stream::Stream;

const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";

/// Connection settings for an OpenAI-compatible endpoint
#[derive(Debug, Clone)]
pub struct OpenAiSettings {
    pub api_key: String,
    pub api_base: String,
    /// Model used when a request does not name one
    pub model: String,
    pub max_tokens: Option<u32>,
}

impl OpenAiSettings {
    /// Read `OPENAI_API_KEY` and `OPENAI_BASE_URL` through `lookup`
    pub fn from_lookup<F>(model: impl Into<String>, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            api_key: lookup("OPENAI_API_KEY").unwrap_or_default(),
            api_base: lookup("OPENAI_BASE_URL").unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            model: model.into(),
            max_tokens: None,
        }
    }
}

/// OpenAI chat-completions client
#[derive(Clone)]
pub struct OpenAiClient {
    client: Client,
    settings: OpenAiSettings,
}

impl OpenAiClient {
    pub fn new(settings: OpenAiSettings) -> Self {
        Self {
            client: Client::new(),
            settings,
        }
    }

    pub fn settings(&self) -> &OpenAiSettings {
        &self.settings
    }

    /// Create a streaming chat completion
    pub async fn stream_chat(
        &self,
        request: ChatRequest,
    ) -> Result<Pin<Box<dyn Stream<Item = StreamChunk> + Send>>, LlmError> {
        let url = format!(
            "{}/chat/completions",
            self.settings.api_base.trim_end_matches('/')
        );

        let model = request
            .model
            .clone()
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| self.settings.model.clone());

        tracing::debug!(
            api_base = %self.settings.api_base,
            model = %model,
            message_count = request.messages.len(),
            temperature = ?request.temperature,
            "openai stream_chat request"
        );

        let request_body = CreateCompletionRequest {
            model,
            messages: request.messages,
            temperature: request.temperature,
            max_completion_tokens: self.settings.max_tokens,
            response_format: request.response_format.and_then(|format| match format {
                ResponseFormat::Json => Some(ResponseFormatBody {
                    format_type: "json_object",
                }),
                ResponseFormat::Text => None,
            }),
            stream: true,
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.settings.api_key)
            .header("content-type", "application/json")
            .json(&request_body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());

            tracing::warn!(
                status = %status,
                error = %crate::logging::redact_secrets(&error_text),
                "openai api returned error"
            );

            let message = match status.as_u16() {
                401 => format!("Unauthorized: Invalid or missing API key. Please check OPENAI_API_KEY.\n\nDetails: {}", error_text),
                429 => format!("Rate Limit Exceeded: Too many requests. Please wait a moment and try again.\n\nDetails: {}", error_text),
                400 => format!("Bad Request: The request was invalid. Check the model name and parameters.\n\nDetails: {}", error_text),
                500..=599 => format!("Server Error: The API is experiencing issues. Please try again later.\n\nDetails: {}", error_text),
                _ => error_text,
            };

            return Err(LlmError::Api {
                status: status.as_u16(),
                message: crate::logging::redact_secrets(&message),
            });
        }

        let stream = response
            .bytes_stream()
            .eventsource()
            .map(|event| match event {
                Err(e) => Some(StreamChunk::Error(e.to_string())),
                Ok(event) => {
                    if event.data.trim() == "[DONE]" {
                        return Some(StreamChunk::Done);
                    }

                    match serde_json::from_str::<CompletionChunk>(&event.data) {
                        Ok(chunk) => chunk
                            .choices
                            .into_iter()
                            .next()
                            .and_then(|choice| choice.delta.content)
                            .filter(|text| !text.is_empty())
                            .map(StreamChunk::Text),
                        Err(e) => Some(StreamChunk::Error(format!(
                            "Failed to parse stream chunk: {e}"
                        ))),
                    }
                }
            })
            .filter_map(futures::future::ready);

        Ok(Box::pin(stream))
    }
}

#[async_trait::async_trait]
impl ChatCompletion for OpenAiClient {
    async fn complete(&self, request: ChatRequest) -> Result<String, LlmError> {
        let mut stream = self.stream_chat(request).await?;
        let mut text = String::new();

        while let Some(chunk) = stream.next().await {
            match chunk {
                StreamChunk::Text(delta) => text.push_str(&delta),
                StreamChunk::Done => break,
                StreamChunk::Error(err) => return Err(LlmError::Stream(err)),
            }
        }

        tracing::debug!(reply_len = text.len(), "openai completion finished");
        Ok(text)
    }
}

/// Request body for creating a chat completion
#[derive(Debug, Serialize)]
struct CreateCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_completion_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormatBody>,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct ResponseFormatBody {
    #[serde(rename = "type")]
    format_type: &'static str,
}

/// One `chat.completion.chunk` event
#[derive(Debug, Deserialize)]
struct CompletionChunk {
    #[serde(default)]
    choices: Vec<ChunkChoice>,
}

#[derive(Debug, Deserialize)]
struct ChunkChoice {
    delta: ChunkDelta,
}

#[derive(Debug, Deserialize)]
struct ChunkDelta {
    content: Option<String>,
}
