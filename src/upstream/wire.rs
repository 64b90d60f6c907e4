//! JSON shapes spoken by the Ollama REST API.

use serde::{Deserialize, Serialize};

use crate::model::{ChatMessage, RuntimeOptions};

#[derive(Debug, Serialize)]
pub(crate) struct GenerateBody<'a> {
    pub model: &'a str,
    pub prompt: &'a str,
    pub stream: bool,
    pub options: &'a RuntimeOptions,
}

#[derive(Debug, Serialize)]
pub(crate) struct ChatBody<'a> {
    pub model: &'a str,
    pub messages: &'a [ChatMessage],
    pub stream: bool,
    pub options: &'a RuntimeOptions,
}

#[derive(Debug, Serialize)]
pub(crate) struct PullBody<'a> {
    pub model: &'a str,
    pub stream: bool,
}

/// One `/api/generate` reply, or one line of its stream.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct GenerateChunk {
    #[serde(default)]
    pub response: String,
    #[serde(default)]
    pub done: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ReplyMessage {
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub content: String,
}

/// One `/api/chat` reply, or one line of its stream.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ChatChunk {
    #[serde(default)]
    pub message: Option<ReplyMessage>,
    #[serde(default)]
    pub done: bool,
}

/// One line of the `/api/pull` progress stream.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PullProgress {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub completed: Option<u64>,
    #[serde(default)]
    pub total: Option<u64>,
    #[serde(default)]
    pub digest: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ModelList {
    #[serde(default)]
    pub models: Vec<serde_json::Value>,
}
