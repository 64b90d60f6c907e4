use serde::{Deserialize, Serialize};

use crate::error::ServiceError;

fn default_stream() -> Option<bool> {
    Some(true)
}

fn default_temperature() -> Option<f64> {
    Some(0.7)
}

fn default_top_p() -> Option<f64> {
    Some(0.9)
}

fn default_top_k() -> Option<i64> {
    Some(40)
}

fn default_max_tokens() -> Option<i64> {
    Some(512)
}

fn default_presence_penalty() -> Option<f64> {
    Some(1.1)
}

/// Sampling knobs shared by generate and chat.
///
/// Absent keys take the service defaults; an explicit `null` clears the
/// field so it is left to the runtime.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SamplingParams {
    #[serde(default = "default_temperature")]
    pub temperature: Option<f64>,
    #[serde(default = "default_top_p")]
    pub top_p: Option<f64>,
    #[serde(default = "default_top_k")]
    pub top_k: Option<i64>,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: Option<i64>,
    #[serde(default)]
    pub seed: Option<i64>,
    #[serde(default = "default_presence_penalty")]
    pub presence_penalty: Option<f64>,
}

impl Default for SamplingParams {
    fn default() -> Self {
        Self {
            temperature: default_temperature(),
            top_p: default_top_p(),
            top_k: default_top_k(),
            max_tokens: default_max_tokens(),
            seed: None,
            presence_penalty: default_presence_penalty(),
        }
    }
}

impl SamplingParams {
    /// Every field unset; the runtime decides.
    pub fn unset() -> Self {
        Self {
            temperature: None,
            top_p: None,
            top_k: None,
            max_tokens: None,
            seed: None,
            presence_penalty: None,
        }
    }

    pub fn validate(&self) -> Result<(), ServiceError> {
        check_range("temperature", self.temperature, 0.0, 1.0)?;
        check_range("top_p", self.top_p, 0.0, 1.0)?;
        check_range("presence_penalty", self.presence_penalty, 0.0, 5.0)?;
        check_min("top_k", self.top_k, 0)?;
        check_min("max_tokens", self.max_tokens, 1)?;
        Ok(())
    }
}

fn check_range(field: &str, value: Option<f64>, min: f64, max: f64) -> Result<(), ServiceError> {
    match value {
        Some(v) if !(min..=max).contains(&v) => Err(ServiceError::Validation(format!(
            "{field} must be between {min} and {max}, got {v}"
        ))),
        _ => Ok(()),
    }
}

fn check_min(field: &str, value: Option<i64>, min: i64) -> Result<(), ServiceError> {
    match value {
        Some(v) if v < min => Err(ServiceError::Validation(format!(
            "{field} must be at least {min}, got {v}"
        ))),
        _ => Ok(()),
    }
}

#[derive(Debug, Deserialize)]
pub struct GenerationRequest {
    pub prompt: String,
    #[serde(default)]
    pub model: Option<String>,
    /// Absent means streaming; an explicit `null` means a single reply.
    #[serde(default = "default_stream")]
    pub stream: Option<bool>,
    #[serde(flatten)]
    pub sampling: SamplingParams,
}

impl GenerationRequest {
    pub fn validate(&self) -> Result<(), ServiceError> {
        self.sampling.validate()
    }

    pub fn streaming(&self) -> bool {
        self.stream.unwrap_or(false)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
    /// Base64 encoded images for multimodal models.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<String>>,
}

impl ChatMessage {
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
            images: None,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub model: Option<String>,
    pub messages: Vec<ChatMessage>,
    #[serde(default)]
    pub system_prompt: Option<String>,
    /// Absent means streaming; an explicit `null` means a single reply.
    #[serde(default = "default_stream")]
    pub stream: Option<bool>,
    #[serde(flatten)]
    pub sampling: SamplingParams,
}

impl ChatRequest {
    pub fn validate(&self) -> Result<(), ServiceError> {
        self.sampling.validate()
    }

    pub fn streaming(&self) -> bool {
        self.stream.unwrap_or(false)
    }

    /// The message sequence sent upstream: a non-empty system prompt first,
    /// then the caller's messages. The request itself is left untouched.
    pub fn conversation(&self) -> Vec<ChatMessage> {
        let system = self
            .system_prompt
            .as_deref()
            .filter(|prompt| !prompt.is_empty())
            .map(|prompt| ChatMessage::new("system", prompt));

        system
            .into_iter()
            .chain(self.messages.iter().cloned())
            .collect()
    }
}

#[derive(Debug, Deserialize)]
pub struct PullRequest {
    pub llm_name: String,
}

#[derive(Debug, Serialize)]
pub struct GenerationResponse {
    pub response: String,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub message: ChatMessage,
}

#[derive(Debug, Serialize)]
pub struct ModelsResponse {
    pub models: Vec<serde_json::Value>,
}
