use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{error, info};

use crate::{
    bridge,
    config::AppConfig,
    error::ServiceError,
    extract::ApiJson,
    model::{
        ChatMessage, ChatRequest, ChatResponse, GenerationRequest, GenerationResponse,
        ModelsResponse, PullRequest, RuntimeOptions,
    },
    upstream::InferenceRuntime,
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub runtime: Arc<dyn InferenceRuntime>,
}

impl AppState {
    fn model_or_default(&self, requested: Option<String>) -> String {
        requested.unwrap_or_else(|| self.config.default_model.clone())
    }
}

pub fn build_router(config: Arc<AppConfig>, runtime: Arc<dyn InferenceRuntime>) -> Router {
    let state = AppState { config, runtime };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/api/generate", post(generate))
        .route("/api/chat", post(chat))
        .route("/api/tags", get(list_models))
        .route("/api/pull", post(pull_model))
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

async fn health() -> &'static str {
    "ok"
}

async fn generate(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<GenerationRequest>,
) -> Result<Response, ServiceError> {
    request.validate()?;
    let stream = request.streaming();
    let model = state.model_or_default(request.model);
    let options = RuntimeOptions::from(&request.sampling);
    info!(%model, stream, "generate");

    if stream {
        let upstream = state
            .runtime
            .generate_stream(&model, &request.prompt, &options)
            .await
            .inspect_err(|err| error!(%err, "failed to start generate stream"))?;
        return Ok(bridge::text_response(bridge::text_bridge(upstream)));
    }

    let reply = state
        .runtime
        .generate(&model, &request.prompt, &options)
        .await
        .inspect_err(|err| error!(%err, "generate failed"))?;
    Ok(Json(GenerationResponse {
        response: reply.response,
    })
    .into_response())
}

async fn chat(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<ChatRequest>,
) -> Result<Response, ServiceError> {
    request.validate()?;
    let messages = request.conversation();
    let options = RuntimeOptions::from(&request.sampling);
    let stream = request.streaming();
    let model = state.model_or_default(request.model);
    info!(%model, stream, messages = messages.len(), "chat");

    if stream {
        let upstream = state.runtime.chat_stream(&model, &messages, &options).await;
        return Ok(bridge::chat_response(upstream));
    }

    let reply = state
        .runtime
        .chat(&model, &messages, &options)
        .await
        .inspect_err(|err| error!(%err, "chat failed"))?;
    let message = reply
        .message
        .ok_or_else(|| ServiceError::Upstream("runtime reply has no message".into()))
        .inspect_err(|err| error!(%err, "chat failed"))?;
    Ok(Json(ChatResponse {
        message: ChatMessage::new(message.role, message.content),
    })
    .into_response())
}

async fn list_models(State(state): State<AppState>) -> Result<Json<ModelsResponse>, ServiceError> {
    let list = state.runtime.list().await.map_err(|err| {
        error!(%err, "error fetching models");
        err.context("Error fetching models")
    })?;
    Ok(Json(ModelsResponse {
        models: list.models,
    }))
}

async fn pull_model(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<PullRequest>,
) -> Response {
    info!(model = %request.llm_name, "pull");
    let upstream = state.runtime.pull_stream(&request.llm_name).await;
    bridge::pull_response(upstream)
}
