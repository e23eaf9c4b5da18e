//! Inference types shared with the extraction framework

use crate::core::schema::LlamaCppSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One candidate output for a prompt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredOutput {
    pub score: f64,
    pub output: String,
}

/// Per-call generation overrides
#[derive(Debug, Clone, Default)]
pub struct InferenceOptions {
    pub temperature: Option<f32>,
    pub max_output_tokens: Option<u32>,
    pub top_p: Option<f32>,
    /// Passed through to the request body verbatim
    pub extra: Map<String, Value>,
}

/// Provider construction arguments
#[derive(Debug, Clone, Default)]
pub struct ProviderKwargs {
    pub model_id: Option<String>,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub system_prompt: Option<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    /// Request timeout in seconds
    pub request_timeout: Option<u64>,
    pub max_workers: Option<usize>,
    pub response_schema: Option<Value>,
    pub structured_output: bool,
}

impl ProviderKwargs {
    /// Preset a structured-output schema
    pub fn with_schema(mut self, schema: &LlamaCppSchema) -> Self {
        let config = schema.to_provider_config();
        self.response_schema = Some(config.response_schema);
        self.structured_output = config.structured_output;
        self
    }
}

/// Factory input: route by `model_id`, or pick `provider` explicitly
#[derive(Debug, Clone, Default)]
pub struct ModelConfig {
    pub model_id: Option<String>,
    pub provider: Option<String>,
    pub provider_kwargs: ProviderKwargs,
}

impl ModelConfig {
    pub fn for_model(model_id: impl Into<String>) -> Self {
        Self {
            model_id: Some(model_id.into()),
            ..Default::default()
        }
    }
}
