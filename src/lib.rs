pub mod bridge;
pub mod config;
pub mod error;
pub mod extract;
pub mod model;
pub mod server;
pub mod upstream;

pub use config::AppConfig;
pub use error::ServiceError;
pub use model::{ChatMessage, ChatRequest, GenerationRequest, RuntimeOptions, SamplingParams};
pub use server::build_router;
pub use upstream::{InferenceRuntime, OllamaClient};
