use crate::domain::ports::GenerationBackend;
use crate::utils::error::ExtractionError;
use crate::utils::logger::mask_secret;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fmt;
use std::time::Duration;

/// Local Ollama answers slowly on CPU-only hosts.
pub const OLLAMA_TIMEOUT_SECONDS: u64 = 300;
pub const INTERACTIVE_TIMEOUT_SECONDS: u64 = 60;

/// 預設的生成服務
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderPreset {
    Ollama,
    OpenAi,
    OpenRouter,
    DeepSeek,
    Custom,
}

impl ProviderPreset {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "ollama" | "local" => Some(ProviderPreset::Ollama),
            "openai" | "chatgpt" => Some(ProviderPreset::OpenAi),
            "openrouter" => Some(ProviderPreset::OpenRouter),
            "deepseek" => Some(ProviderPreset::DeepSeek),
            "custom" => Some(ProviderPreset::Custom),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderPreset::Ollama => "ollama",
            ProviderPreset::OpenAi => "openai",
            ProviderPreset::OpenRouter => "openrouter",
            ProviderPreset::DeepSeek => "deepseek",
            ProviderPreset::Custom => "custom",
        }
    }

    /// Base URL; `custom` has none and must be configured.
    pub fn default_endpoint(&self) -> Option<&'static str> {
        match self {
            ProviderPreset::Ollama => Some("http://localhost:11434"),
            ProviderPreset::OpenAi => Some("https://api.openai.com/v1"),
            ProviderPreset::OpenRouter => Some("https://openrouter.ai/api/v1"),
            ProviderPreset::DeepSeek => Some("https://api.deepseek.com/v1"),
            ProviderPreset::Custom => None,
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            ProviderPreset::Ollama => "llama3.1:8b",
            ProviderPreset::OpenAi => "gpt-3.5-turbo",
            ProviderPreset::OpenRouter => "anthropic/claude-3-haiku",
            ProviderPreset::DeepSeek => "deepseek-chat",
            ProviderPreset::Custom => "default",
        }
    }

    pub fn api_key_env(&self) -> Option<&'static str> {
        match self {
            ProviderPreset::Ollama | ProviderPreset::Custom => None,
            ProviderPreset::OpenAi => Some("OPENAI_API_KEY"),
            ProviderPreset::OpenRouter => Some("OPENROUTER_API_KEY"),
            ProviderPreset::DeepSeek => Some("DEEPSEEK_API_KEY"),
        }
    }

    pub fn default_timeout_seconds(&self) -> u64 {
        match self {
            ProviderPreset::Ollama => OLLAMA_TIMEOUT_SECONDS,
            _ => INTERACTIVE_TIMEOUT_SECONDS,
        }
    }

    pub fn requires_api_key(&self) -> bool {
        self.api_key_env().is_some()
    }
}

impl fmt::Display for ProviderPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ollama `/api/generate` with streaming disabled.
pub struct OllamaBackend {
    client: Client,
    endpoint: String,
    model: String,
    temperature: f32,
    timeout: Duration,
}

impl OllamaBackend {
    pub fn new(endpoint: &str, model: &str, temperature: f32, timeout: Duration) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.trim_end_matches('/').to_string(),
            model: model.to_string(),
            temperature,
            timeout,
        }
    }

    fn url(&self) -> String {
        format!("{}/api/generate", self.endpoint)
    }
}

#[derive(Deserialize)]
struct OllamaReply {
    response: String,
}

#[async_trait]
impl GenerationBackend for OllamaBackend {
    fn name(&self) -> &str {
        "ollama"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn generate(&self, prompt: &str) -> std::result::Result<String, ExtractionError> {
        let body = json!({
            "model": self.model,
            "prompt": prompt,
            "stream": false,
            "options": { "temperature": self.temperature },
        });
        let url = self.url();
        tracing::debug!("Making generation request to: {}", url);

        let request = async {
            let response = self
                .client
                .post(&url)
                .json(&body)
                .send()
                .await
                .map_err(|e| transport_error(&url, e))?;
            let response = check_status(response).await?;
            let reply: OllamaReply = response.json().await.map_err(|e| {
                ExtractionError::MalformedResponse {
                    message: format!("Ollama reply without 'response': {}", e),
                }
            })?;
            Ok(reply.response)
        };

        with_timeout(self.timeout, request).await
    }
}

/// OpenAI-compatible `/chat/completions` (OpenAI, OpenRouter, DeepSeek, custom).
pub struct ChatCompletionsBackend {
    client: Client,
    name: String,
    endpoint: String,
    model: String,
    api_key: Option<String>,
    /// Keyless local servers speak the same protocol.
    key_required: bool,
    temperature: f32,
    timeout: Duration,
}

impl ChatCompletionsBackend {
    pub fn new(
        name: &str,
        endpoint: &str,
        model: &str,
        api_key: Option<String>,
        temperature: f32,
        timeout: Duration,
    ) -> Self {
        Self {
            client: Client::new(),
            name: name.to_string(),
            endpoint: endpoint.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            key_required: true,
            temperature,
            timeout,
        }
    }

    /// Sends requests without `Authorization` when no key is configured.
    pub fn with_optional_key(mut self) -> Self {
        self.key_required = false;
        self
    }

    fn url(&self) -> String {
        if self.endpoint.ends_with("/chat/completions") {
            self.endpoint.clone()
        } else {
            format!("{}/chat/completions", self.endpoint)
        }
    }
}

#[derive(Deserialize)]
struct ChatReply {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

#[async_trait]
impl GenerationBackend for ChatCompletionsBackend {
    fn name(&self) -> &str {
        &self.name
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn generate(&self, prompt: &str) -> std::result::Result<String, ExtractionError> {
        let api_key = self.api_key.as_deref();
        match api_key {
            Some(key) => tracing::debug!(
                "Making chat completion request to {} with key {}",
                self.url(),
                mask_secret(key)
            ),
            None if self.key_required => {
                return Err(ExtractionError::InvalidCredentials {
                    message: format!("no API key configured for {}", self.name),
                })
            }
            None => tracing::debug!("Making chat completion request to {} without a key", self.url()),
        }

        let body = json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": "You extract domain models from software requirements and answer with JSON only." },
                { "role": "user", "content": prompt },
            ],
            "temperature": self.temperature,
        });
        let url = self.url();

        let request = async {
            let mut builder = self.client.post(&url);
            if let Some(key) = api_key {
                builder = builder.bearer_auth(key);
            }
            let response = builder
                .header("Content-Type", "application/json")
                .json(&body)
                .send()
                .await
                .map_err(|e| transport_error(&url, e))?;
            let response = check_status(response).await?;
            let reply: ChatReply =
                response
                    .json()
                    .await
                    .map_err(|e| ExtractionError::MalformedResponse {
                        message: format!("unexpected chat completion body: {}", e),
                    })?;
            reply
                .choices
                .into_iter()
                .next()
                .and_then(|choice| choice.message.content)
                .ok_or_else(|| ExtractionError::MalformedResponse {
                    message: "chat completion without content".to_string(),
                })
        };

        with_timeout(self.timeout, request).await
    }
}

async fn with_timeout<F>(
    timeout: Duration,
    request: F,
) -> std::result::Result<String, ExtractionError>
where
    F: std::future::Future<Output = std::result::Result<String, ExtractionError>>,
{
    match tokio::time::timeout(timeout, request).await {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!("⏱️ Generation request exceeded {:?}", timeout);
            Err(ExtractionError::Timeout {
                seconds: timeout.as_secs(),
            })
        }
    }
}

fn transport_error(url: &str, e: reqwest::Error) -> ExtractionError {
    if e.is_timeout() {
        return ExtractionError::Timeout { seconds: 0 };
    }
    ExtractionError::ProviderUnavailable {
        message: format!("{}: {}", url, e),
    }
}

async fn check_status(
    response: reqwest::Response,
) -> std::result::Result<reqwest::Response, ExtractionError> {
    let status = response.status();
    tracing::debug!("Generation response status: {}", status);
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = format!("HTTP {}: {}", status, body.chars().take(200).collect::<String>());
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            Err(ExtractionError::InvalidCredentials { message })
        }
        _ => Err(ExtractionError::ProviderUnavailable { message }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets() {
        assert_eq!(ProviderPreset::parse("OpenRouter"), Some(ProviderPreset::OpenRouter));
        assert_eq!(ProviderPreset::parse("gemini"), None);
        assert_eq!(ProviderPreset::Ollama.default_timeout_seconds(), 300);
        assert_eq!(ProviderPreset::DeepSeek.default_timeout_seconds(), 60);
        assert!(!ProviderPreset::Ollama.requires_api_key());
        assert_eq!(ProviderPreset::OpenAi.api_key_env(), Some("OPENAI_API_KEY"));
        assert_eq!(ProviderPreset::Custom.default_endpoint(), None);
    }

    #[test]
    fn test_chat_url() {
        let backend = ChatCompletionsBackend::new(
            "openai",
            "https://api.openai.com/v1/",
            "gpt",
            None,
            0.1,
            Duration::from_secs(1),
        );
        assert_eq!(backend.url(), "https://api.openai.com/v1/chat/completions");
    }

    #[tokio::test]
    async fn test_missing_key_is_invalid_credentials() {
        let backend = ChatCompletionsBackend::new(
            "openrouter",
            "http://127.0.0.1:9",
            "m",
            Some("  ".to_string()),
            0.1,
            Duration::from_secs(1),
        );
        let err = backend.generate("hi").await.unwrap_err();
        assert!(matches!(err, ExtractionError::InvalidCredentials { .. }));
    }

    #[tokio::test]
    async fn test_unreachable_ollama_is_provider_unavailable() {
        let backend = OllamaBackend::new("http://127.0.0.1:9", "m", 0.1, Duration::from_secs(5));
        let err = backend.generate("hi").await.unwrap_err();
        assert!(matches!(
            err,
            ExtractionError::ProviderUnavailable { .. } | ExtractionError::Timeout { .. }
        ));
        assert!(err.is_retryable());
    }
}
