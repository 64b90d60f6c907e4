//! Scripted stand-in for the inference runtime.

#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use axum::{Router, body::Body, http::Request, response::Response};
use futures_util::{StreamExt, stream};
use http_body_util::BodyExt;
use parking_lot::Mutex;
use tower::ServiceExt;

use ollama_gateway::{
    AppConfig, ChatMessage, InferenceRuntime, RuntimeOptions, ServiceError, build_router,
    upstream::{ChatChunk, GenerateChunk, ModelList, PullProgress, ReplyMessage, RuntimeStream},
};

pub const DONE_FRAME: &str = "data: [DONE]\n\n";

#[derive(Debug, Clone)]
pub struct Call {
    pub op: &'static str,
    pub model: String,
    pub prompt: Option<String>,
    pub messages: Vec<ChatMessage>,
    pub options: Option<serde_json::Value>,
}

/// Replies with canned chunks; optionally fails to start, or fails after
/// the last chunk.
#[derive(Default)]
pub struct FakeRuntime {
    pub chunks: Vec<String>,
    /// Non-streaming chat replies carry no `message`.
    pub no_message: bool,
    pub fail_to_start: Option<String>,
    pub fail_mid_stream: Option<String>,
    pub models: Vec<serde_json::Value>,
    pub progress: Vec<PullProgress>,
    pub calls: Mutex<Vec<Call>>,
}

impl FakeRuntime {
    pub fn replying(chunks: &[&str]) -> Self {
        Self {
            chunks: chunks.iter().map(|c| c.to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn failing_to_start(message: &str) -> Self {
        Self {
            fail_to_start: Some(message.to_string()),
            ..Self::default()
        }
    }

    pub fn failing_mid_stream(chunks: &[&str], message: &str) -> Self {
        Self {
            fail_mid_stream: Some(message.to_string()),
            ..Self::replying(chunks)
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    fn record(
        &self,
        op: &'static str,
        model: &str,
        prompt: Option<&str>,
        messages: &[ChatMessage],
        options: Option<&RuntimeOptions>,
    ) -> Result<(), ServiceError> {
        self.calls.lock().push(Call {
            op,
            model: model.to_string(),
            prompt: prompt.map(str::to_string),
            messages: messages.to_vec(),
            options: options.map(|o| serde_json::to_value(o).unwrap()),
        });
        match &self.fail_to_start {
            Some(message) => Err(ServiceError::Upstream(message.clone())),
            None => Ok(()),
        }
    }

    fn script<T: Send + 'static>(&self, make: impl Fn(&str) -> T) -> RuntimeStream<T> {
        let mut items: Vec<Result<T, ServiceError>> =
            self.chunks.iter().map(|c| Ok(make(c))).collect();
        if let Some(message) = &self.fail_mid_stream {
            items.push(Err(ServiceError::Transport(message.clone())));
        }
        stream::iter(items).boxed()
    }
}

fn generate_chunk(text: &str) -> GenerateChunk {
    GenerateChunk {
        response: text.to_string(),
        done: false,
    }
}

fn chat_chunk(text: &str) -> ChatChunk {
    ChatChunk {
        message: Some(ReplyMessage {
            role: "assistant".to_string(),
            content: text.to_string(),
        }),
        done: false,
    }
}

#[async_trait]
impl InferenceRuntime for FakeRuntime {
    async fn generate(
        &self,
        model: &str,
        prompt: &str,
        options: &RuntimeOptions,
    ) -> Result<GenerateChunk, ServiceError> {
        self.record("generate", model, Some(prompt), &[], Some(options))?;
        Ok(generate_chunk(&self.chunks.concat()))
    }

    async fn generate_stream(
        &self,
        model: &str,
        prompt: &str,
        options: &RuntimeOptions,
    ) -> Result<RuntimeStream<GenerateChunk>, ServiceError> {
        self.record("generate_stream", model, Some(prompt), &[], Some(options))?;
        Ok(self.script(generate_chunk))
    }

    async fn chat(
        &self,
        model: &str,
        messages: &[ChatMessage],
        options: &RuntimeOptions,
    ) -> Result<ChatChunk, ServiceError> {
        self.record("chat", model, None, messages, Some(options))?;
        if self.no_message {
            return Ok(ChatChunk {
                message: None,
                done: true,
            });
        }
        Ok(chat_chunk(&self.chunks.concat()))
    }

    async fn chat_stream(
        &self,
        model: &str,
        messages: &[ChatMessage],
        options: &RuntimeOptions,
    ) -> Result<RuntimeStream<ChatChunk>, ServiceError> {
        self.record("chat_stream", model, None, messages, Some(options))?;
        Ok(self.script(chat_chunk))
    }

    async fn list(&self) -> Result<ModelList, ServiceError> {
        self.record("list", "", None, &[], None)?;
        Ok(ModelList {
            models: self.models.clone(),
        })
    }

    async fn pull_stream(&self, model: &str) -> Result<RuntimeStream<PullProgress>, ServiceError> {
        self.record("pull", model, None, &[], None)?;
        let mut items: Vec<Result<PullProgress, ServiceError>> =
            self.progress.iter().cloned().map(Ok).collect();
        if let Some(message) = &self.fail_mid_stream {
            items.push(Err(ServiceError::Transport(message.clone())));
        }
        Ok(stream::iter(items).boxed())
    }
}

pub fn router(runtime: Arc<FakeRuntime>) -> Router {
    build_router(Arc::new(AppConfig::default()), runtime)
}

pub fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub async fn send(app: Router, request: Request<Body>) -> Response {
    app.oneshot(request).await.unwrap()
}

pub async fn body_text(response: Response) -> String {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(body.to_vec()).unwrap()
}

pub async fn body_json(response: Response) -> serde_json::Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap_or_else(|e| panic!("Expected valid JSON body: {e}"))
}

/// Split an SSE body into its `data:` frames, each with its trailing blank line.
pub fn sse_frames(body: &str) -> Vec<String> {
    body.split_inclusive("\n\n").map(str::to_string).collect()
}
