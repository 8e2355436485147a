use async_trait::async_trait;
use bytes::BytesMut;
use futures_util::StreamExt;
use log::{debug, error, warn};
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::time::Duration;

use crate::app_config::ProviderConfig;
use crate::errors::ProviderError;
use crate::providers::Provider;

/// Client for OpenAI-compatible chat completion endpoints
#[derive(Debug)]
pub struct OpenAI {
    /// HTTP client for API requests
    client: Client,
    /// Base URL, e.g. `https://api.openai.com/v1`
    endpoint: String,
    /// Bearer token, omitted from requests when empty
    api_key: String,
    /// Model name sent with every request
    model: String,
    /// Sampling temperature, server default when absent
    temperature: Option<f32>,
    /// Maximum number of retry attempts
    max_retries: u32,
    /// Base backoff time in milliseconds for exponential backoff
    backoff_base_ms: u64,
    /// Whether to request a server-sent event stream
    stream: bool,
    /// Whether streamed fragments are echoed to stdout
    echo_stream: bool,
}

/// Chat completion request
#[derive(Debug, Clone, Serialize)]
pub struct OpenAIRequest {
    /// The model to use
    pub model: String,

    /// The messages for the conversation
    pub messages: Vec<OpenAIMessage>,

    /// Temperature for generation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    /// Whether the reply is streamed as server-sent events
    pub stream: bool,
}

/// Chat message format
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAIMessage {
    /// Role of the message sender (system, user, assistant)
    pub role: String,

    /// Content of the message
    #[serde(default)]
    pub content: Option<String>,
}

/// Token usage information
#[derive(Debug, Clone, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
}

/// Non-streamed chat completion response
#[derive(Debug, Clone, Deserialize)]
pub struct OpenAIResponse {
    /// Candidate replies, the first one is used
    pub choices: Vec<OpenAIChoice>,
    /// Token usage information
    #[serde(default)]
    pub usage: Option<TokenUsage>,
}

/// Individual choice in a response
#[derive(Debug, Clone, Deserialize)]
pub struct OpenAIChoice {
    pub message: OpenAIMessage,
}

/// One `data:` payload of a streamed response
#[derive(Debug, Deserialize)]
struct StreamChunk {
    #[serde(default)]
    choices: Vec<StreamChoice>,
}

#[derive(Debug, Deserialize)]
struct StreamChoice {
    #[serde(default)]
    delta: StreamDelta,
}

#[derive(Debug, Default, Deserialize)]
struct StreamDelta {
    #[serde(default)]
    content: Option<String>,
}

/// Meaning of a single line of a server-sent event stream
#[derive(Debug, PartialEq)]
pub(crate) enum SseEvent {
    /// A fragment of the reply, possibly empty
    Delta(String),
    /// The end-of-stream sentinel
    Done,
    /// Comments, blank lines, and non-data fields
    Skip,
}

impl OpenAIRequest {
    /// Create a single-turn request holding the prompt as the user message
    pub fn new(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            messages: vec![OpenAIMessage {
                role: "user".to_string(),
                content: Some(prompt.into()),
            }],
            temperature: None,
            stream: false,
        }
    }

    /// Set the temperature
    pub fn temperature(mut self, temperature: Option<f32>) -> Self {
        self.temperature = temperature;
        self
    }

    /// Request a streamed reply
    pub fn stream(mut self, stream: bool) -> Self {
        self.stream = stream;
        self
    }
}

impl OpenAI {
    /// Create a client from the provider section of the configuration
    pub fn from_config(config: &ProviderConfig) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(config.timeout_secs))
                .pool_idle_timeout(Duration::from_secs(90))
                .tcp_keepalive(Duration::from_secs(60))
                .build()
                .unwrap_or_default(),
            endpoint: config.endpoint.clone(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            temperature: config.temperature,
            max_retries: config.retry_count,
            backoff_base_ms: config.retry_backoff_ms,
            stream: config.stream,
            echo_stream: config.echo_stream,
        }
    }

    /// Model name used for requests
    pub fn model(&self) -> &str {
        &self.model
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.endpoint.trim_end_matches('/'))
    }

    /// Complete a chat request, retrying transient failures with exponential backoff
    pub async fn complete(&self, request: &OpenAIRequest) -> Result<String, ProviderError> {
        let url = self.completions_url();
        let mut attempt = 0;

        loop {
            match self.send_once(&url, request).await {
                Ok(text) => return Ok(text),
                Err(e) if e.is_retryable() && attempt < self.max_retries => {
                    let delay_ms = self.backoff_base_ms.saturating_mul(2u64.saturating_pow(attempt));
                    attempt += 1;
                    warn!(
                        "Request to {} failed ({}), retry {}/{} in {} ms",
                        url, e, attempt, self.max_retries, delay_ms
                    );
                    tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn send_once(&self, url: &str, request: &OpenAIRequest) -> Result<String, ProviderError> {
        let mut builder = self.client.post(url).json(request);
        if !self.api_key.is_empty() {
            builder = builder.bearer_auth(&self.api_key);
        }

        let response = builder.send().await.map_err(map_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to get error response text".to_string());
            error!("Chat completion API error ({}): {}", status, error_text);
            return Err(status_error(status, error_text));
        }

        if request.stream {
            self.read_stream(response).await
        } else {
            let body = response
                .json::<OpenAIResponse>()
                .await
                .map_err(|e| ProviderError::ParseError(e.to_string()))?;
            if let Some(usage) = &body.usage {
                debug!(
                    "Token usage: {} prompt, {} completion, {} total",
                    usage.prompt_tokens, usage.completion_tokens, usage.total_tokens
                );
            }
            Ok(Self::extract_text(&body))
        }
    }

    async fn read_stream(&self, response: Response) -> Result<String, ProviderError> {
        let mut stream = response.bytes_stream();
        let mut buffer = BytesMut::new();
        let mut full_response = String::new();

        'outer: while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(map_transport_error)?;
            buffer.extend_from_slice(&chunk);

            while let Some(pos) = buffer.iter().position(|b| *b == b'\n') {
                let line = buffer.split_to(pos + 1);
                let line = String::from_utf8_lossy(&line);
                if self.apply_event(parse_sse_line(line.trim_end())?, &mut full_response) {
                    break 'outer;
                }
            }
        }

        if !buffer.is_empty() {
            let line = String::from_utf8_lossy(&buffer);
            self.apply_event(parse_sse_line(line.trim_end())?, &mut full_response);
        }

        if self.echo_stream {
            println!();
        }

        Ok(full_response)
    }

    /// Append a streamed fragment; returns true once the stream is finished
    fn apply_event(&self, event: SseEvent, full_response: &mut String) -> bool {
        match event {
            SseEvent::Delta(fragment) => {
                if self.echo_stream && !fragment.is_empty() {
                    let mut stdout = std::io::stdout();
                    let _ = write!(stdout, "{}", fragment);
                    let _ = stdout.flush();
                }
                full_response.push_str(&fragment);
                false
            }
            SseEvent::Done => true,
            SseEvent::Skip => false,
        }
    }

    /// Extract text from a non-streamed response
    pub fn extract_text(response: &OpenAIResponse) -> String {
        response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl Provider for OpenAI {
    async fn generate(&self, prompt: &str) -> Result<String, ProviderError> {
        let request = OpenAIRequest::new(self.model.clone(), prompt)
            .temperature(self.temperature)
            .stream(self.stream);
        self.complete(&request).await
    }
}

fn map_transport_error(e: reqwest::Error) -> ProviderError {
    if e.is_timeout() || e.is_connect() || e.is_body() {
        ProviderError::ConnectionError(e.to_string())
    } else {
        ProviderError::RequestFailed(e.to_string())
    }
}

fn status_error(status: StatusCode, message: String) -> ProviderError {
    match status.as_u16() {
        401 | 403 => ProviderError::AuthenticationError(message),
        429 => ProviderError::RateLimitExceeded(message),
        status_code => ProviderError::ApiError { status_code, message },
    }
}

/// Interpret one line of a server-sent event stream
pub(crate) fn parse_sse_line(line: &str) -> Result<SseEvent, ProviderError> {
    let Some(data) = line.strip_prefix("data:") else {
        return Ok(SseEvent::Skip);
    };
    let data = data.trim();
    if data.is_empty() {
        return Ok(SseEvent::Skip);
    }
    if data == "[DONE]" {
        return Ok(SseEvent::Done);
    }

    let chunk: StreamChunk = serde_json::from_str(data)
        .map_err(|e| ProviderError::ParseError(format!("{}: {}", e, data)))?;
    let fragment = chunk
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.delta.content)
        .unwrap_or_default();
    Ok(SseEvent::Delta(fragment))
}
