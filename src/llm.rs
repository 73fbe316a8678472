//! Text generation clients (Gemini and OpenRouter)

use std::time::Duration;

use async_trait::async_trait;
use log::{debug, error};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;

const OPENROUTER_ENDPOINT: &str = "https://openrouter.ai/api/v1/chat/completions";
const OPENROUTER_REFERER: &str = "https://daily-arena.app";
const OPENROUTER_TITLE: &str = "Daily Arena";

/// A single prompt sent to the model
#[derive(Debug, Clone)]
pub struct LlmRequest {
    pub prompt: String,
    pub temperature: f32,
}

impl LlmRequest {
    pub fn new(prompt: impl Into<String>, temperature: f32) -> Self {
        Self {
            prompt: prompt.into(),
            temperature,
        }
    }
}

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("http error: {0}")]
    Http(String),
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("response error: {0}")]
    Response(String),
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl LlmError {
    pub fn status(&self) -> Option<u16> {
        match self {
            LlmError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, request: LlmRequest) -> Result<String, LlmError>;
}

fn build_http_client(timeout_secs: u64) -> Result<reqwest::Client, LlmError> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| LlmError::Http(e.to_string()))
}

async fn read_success_body(response: reqwest::Response) -> Result<String, LlmError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        error!("[llm] request rejected with {}: {}", status, body);
        return Err(LlmError::Status {
            status: status.as_u16(),
            body,
        });
    }
    response
        .text()
        .await
        .map_err(|e| LlmError::Http(e.to_string()))
}

// ============ Gemini ============

#[derive(Debug, Clone)]
pub struct GeminiClientConfig {
    pub api_key: String,
    pub model: String,
    pub endpoint: String,
    pub timeout_secs: u64,
}

impl Default for GeminiClientConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: "gemini-3-flash-preview".to_string(),
            endpoint: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            timeout_secs: 60,
        }
    }
}

pub struct GeminiClient {
    client: reqwest::Client,
    config: GeminiClientConfig,
}

impl GeminiClient {
    pub fn new(config: GeminiClientConfig) -> Result<Self, LlmError> {
        let client = build_http_client(config.timeout_secs)?;
        Ok(Self { client, config })
    }

    fn build_url(&self) -> String {
        format!(
            "{}/models/{}:generateContent?key={}",
            self.config.endpoint, self.config.model, self.config.api_key
        )
    }
}

#[derive(Debug, Serialize)]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(rename = "generationConfig")]
    generation_config: GeminiGenerationConfig,
}

#[derive(Debug, Serialize)]
struct GeminiContent {
    role: String,
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiPart {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Serialize)]
struct GeminiGenerationConfig {
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    candidates: Option<Vec<GeminiCandidate>>,
    error: Option<GeminiErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: GeminiCandidateContent,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidateContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorDetail {
    message: String,
    code: Option<u16>,
}

#[async_trait]
impl LlmClient for GeminiClient {
    async fn complete(&self, request: LlmRequest) -> Result<String, LlmError> {
        let body = GeminiRequest {
            contents: vec![GeminiContent {
                role: "user".to_string(),
                parts: vec![GeminiPart {
                    text: request.prompt,
                }],
            }],
            generation_config: GeminiGenerationConfig {
                temperature: request.temperature,
            },
        };

        debug!("[llm] gemini request model={}", self.config.model);
        let response = self
            .client
            .post(self.build_url())
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::Http(e.to_string()))?;

        let text = read_success_body(response).await?;
        let parsed: GeminiResponse =
            serde_json::from_str(&text).map_err(|e| LlmError::Serialization(e.to_string()))?;

        if let Some(error) = parsed.error {
            return Err(match error.code {
                Some(status) => LlmError::Status {
                    status,
                    body: error.message,
                },
                None => LlmError::Response(format!("Gemini API error: {}", error.message)),
            });
        }

        let content: String = parsed
            .candidates
            .and_then(|c| c.into_iter().next())
            .map(|c| c.content.parts.into_iter().map(|p| p.text).collect())
            .ok_or_else(|| LlmError::Response("No content in response".to_string()))?;

        Ok(content)
    }
}

// ============ OpenRouter ============

#[derive(Debug, Clone)]
pub struct OpenRouterClientConfig {
    pub api_key: String,
    pub model: String,
    pub max_tokens: u32,
    pub timeout_secs: u64,
}

pub struct OpenRouterClient {
    client: reqwest::Client,
    config: OpenRouterClientConfig,
}

impl OpenRouterClient {
    pub fn new(config: OpenRouterClientConfig) -> Result<Self, LlmError> {
        let client = build_http_client(config.timeout_secs)?;
        Ok(Self { client, config })
    }
}

#[async_trait]
impl LlmClient for OpenRouterClient {
    async fn complete(&self, request: LlmRequest) -> Result<String, LlmError> {
        let body = json!({
            "model": self.config.model,
            "messages": [{ "role": "user", "content": request.prompt }],
            "max_tokens": self.config.max_tokens,
            "temperature": request.temperature
        });

        debug!("[llm] openrouter request model={}", self.config.model);
        let response = self
            .client
            .post(OPENROUTER_ENDPOINT)
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .header("HTTP-Referer", OPENROUTER_REFERER)
            .header("X-Title", OPENROUTER_TITLE)
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::Http(e.to_string()))?;

        let text = read_success_body(response).await?;
        let response_json: Value =
            serde_json::from_str(&text).map_err(|e| LlmError::Serialization(e.to_string()))?;

        response_json["choices"][0]["message"]["content"]
            .as_str()
            .map(|s| s.to_string())
            .ok_or_else(|| LlmError::Response("OpenRouter returned empty content".to_string()))
    }
}
