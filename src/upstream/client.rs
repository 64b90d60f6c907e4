use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::{Serialize, de::DeserializeOwned};
use tracing::debug;

use crate::{
    config::AppConfig,
    error::ServiceError,
    model::{ChatMessage, RuntimeOptions},
    upstream::{
        ChatChunk, GenerateChunk, InferenceRuntime, ModelList, PullProgress, RuntimeStream,
        ndjson::{decode_lines, parse_reply, reported_error},
        wire::{ChatBody, GenerateBody, PullBody},
    },
};

/// HTTP client for an Ollama server.
///
/// `reqwest::Client` pools connections internally and is cheap to share,
/// so a single instance serves the whole process.
#[derive(Debug, Clone)]
pub struct OllamaClient {
    http: Client,
    base_url: String,
}

impl OllamaClient {
    /// `timeout` bounds connecting and each individual read, not the whole
    /// exchange, so long generations keep streaming.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ServiceError> {
        let http = Client::builder()
            .connect_timeout(timeout)
            .read_timeout(timeout)
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, ServiceError> {
        Self::new(config.ollama_host.clone(), config.upstream_timeout)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn post<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<Response, ServiceError> {
        let url = self.url(path);
        debug!(%url, "calling runtime");
        let response = self.http.post(&url).json(body).send().await?;
        ensure_success(response).await
    }

    async fn post_once<B, T>(&self, path: &str, body: &B) -> Result<T, ServiceError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self.post(path, body).await?;
        let bytes = response.bytes().await?;
        parse_reply(&bytes)
    }

    async fn post_stream<B, T>(&self, path: &str, body: &B) -> Result<RuntimeStream<T>, ServiceError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned + Send + 'static,
    {
        let response = self.post(path, body).await?;
        Ok(decode_lines(response.bytes_stream()))
    }
}

/// Turn a non-2xx reply into [`ServiceError::Upstream`], preferring the
/// runtime's own `error` message.
async fn ensure_success(response: Response) -> Result<Response, ServiceError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let reported = serde_json::from_str::<serde_json::Value>(&body)
        .ok()
        .as_ref()
        .and_then(reported_error);
    let message = match reported {
        Some(error) => error,
        None if body.trim().is_empty() => status.to_string(),
        None => format!("{status}: {}", body.trim()),
    };
    Err(ServiceError::Upstream(message))
}

#[async_trait]
impl InferenceRuntime for OllamaClient {
    async fn generate(
        &self,
        model: &str,
        prompt: &str,
        options: &RuntimeOptions,
    ) -> Result<GenerateChunk, ServiceError> {
        let body = GenerateBody {
            model,
            prompt,
            stream: false,
            options,
        };
        self.post_once("/api/generate", &body).await
    }

    async fn generate_stream(
        &self,
        model: &str,
        prompt: &str,
        options: &RuntimeOptions,
    ) -> Result<RuntimeStream<GenerateChunk>, ServiceError> {
        let body = GenerateBody {
            model,
            prompt,
            stream: true,
            options,
        };
        self.post_stream("/api/generate", &body).await
    }

    async fn chat(
        &self,
        model: &str,
        messages: &[ChatMessage],
        options: &RuntimeOptions,
    ) -> Result<ChatChunk, ServiceError> {
        let body = ChatBody {
            model,
            messages,
            stream: false,
            options,
        };
        self.post_once("/api/chat", &body).await
    }

    async fn chat_stream(
        &self,
        model: &str,
        messages: &[ChatMessage],
        options: &RuntimeOptions,
    ) -> Result<RuntimeStream<ChatChunk>, ServiceError> {
        let body = ChatBody {
            model,
            messages,
            stream: true,
            options,
        };
        self.post_stream("/api/chat", &body).await
    }

    async fn list(&self) -> Result<ModelList, ServiceError> {
        let url = self.url("/api/tags");
        debug!(%url, "calling runtime");
        let response = ensure_success(self.http.get(&url).send().await?).await?;
        let bytes = response.bytes().await?;
        parse_reply(&bytes)
    }

    async fn pull_stream(&self, model: &str) -> Result<RuntimeStream<PullProgress>, ServiceError> {
        let body = PullBody {
            model,
            stream: true,
        };
        self.post_stream("/api/pull", &body).await
    }
}
