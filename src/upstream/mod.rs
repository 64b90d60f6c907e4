mod client;
mod ndjson;
mod wire;

use async_trait::async_trait;
use futures_util::stream::BoxStream;

use crate::{
    error::ServiceError,
    model::{ChatMessage, RuntimeOptions},
};

pub use client::OllamaClient;
pub use ndjson::decode_lines;
pub use wire::{ChatChunk, GenerateChunk, ModelList, PullProgress, ReplyMessage};

/// Incremental results from the runtime, in the order it produced them.
pub type RuntimeStream<T> = BoxStream<'static, Result<T, ServiceError>>;

/// The operations the gateway needs from the inference runtime.
///
/// One instance is shared by every request, so implementations must be safe
/// to call concurrently. Nothing is retried: a failure is returned as is.
#[async_trait]
pub trait InferenceRuntime: Send + Sync {
    async fn generate(
        &self,
        model: &str,
        prompt: &str,
        options: &RuntimeOptions,
    ) -> Result<GenerateChunk, ServiceError>;

    async fn generate_stream(
        &self,
        model: &str,
        prompt: &str,
        options: &RuntimeOptions,
    ) -> Result<RuntimeStream<GenerateChunk>, ServiceError>;

    async fn chat(
        &self,
        model: &str,
        messages: &[ChatMessage],
        options: &RuntimeOptions,
    ) -> Result<ChatChunk, ServiceError>;

    async fn chat_stream(
        &self,
        model: &str,
        messages: &[ChatMessage],
        options: &RuntimeOptions,
    ) -> Result<RuntimeStream<ChatChunk>, ServiceError>;

    async fn list(&self) -> Result<ModelList, ServiceError>;

    async fn pull_stream(&self, model: &str) -> Result<RuntimeStream<PullProgress>, ServiceError>;
}
