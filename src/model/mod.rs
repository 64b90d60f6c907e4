mod options;
mod types;

pub use options::{MIROSTAT_ETA, MIROSTAT_MODE, MIROSTAT_TAU, RuntimeOptions};
pub use types::{
    ChatMessage, ChatRequest, ChatResponse, GenerationRequest, GenerationResponse,
    ModelsResponse, PullRequest, SamplingParams,
};
