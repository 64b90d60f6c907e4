use serde::Serialize;

use crate::model::SamplingParams;

/// Mirostat 2.0 is always on; these are its mode and learning parameters.
pub const MIROSTAT_MODE: u8 = 2;
pub const MIROSTAT_TAU: f64 = 5.0;
pub const MIROSTAT_ETA: f64 = 0.1;

/// Sampling options in the runtime's vocabulary. Unset fields are skipped
/// on the wire rather than sent as `null`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuntimeOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_k: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_predict: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repeat_penalty: Option<f64>,
    pub mirostat: u8,
    pub mirostat_tau: f64,
    pub mirostat_eta: f64,
}

impl From<&SamplingParams> for RuntimeOptions {
    fn from(params: &SamplingParams) -> Self {
        Self {
            temperature: params.temperature,
            top_p: params.top_p,
            top_k: params.top_k,
            num_predict: params.max_tokens,
            seed: params.seed,
            repeat_penalty: params.presence_penalty,
            mirostat: MIROSTAT_MODE,
            mirostat_tau: MIROSTAT_TAU,
            mirostat_eta: MIROSTAT_ETA,
        }
    }
}
