//! Language model abstraction
//!
//! This module defines the trait every registered provider implements and
//! the errors surfaced to the extraction framework.

use crate::core::client::ClientError;
use crate::core::schema::LlamaCppSchema;
use crate::models::inference::{InferenceOptions, ScoredOutput};
use async_trait::async_trait;
use thiserror::Error;

/// Errors surfaced by providers
#[derive(Debug, Error)]
pub enum InferenceError {
    /// The provider could not be created or resolved
    #[error("Inference configuration error: {0}")]
    Config(String),

    /// A call to the inference backend failed
    #[error("{provider} API error: {source}")]
    Runtime {
        provider: String,
        #[source]
        source: ClientError,
    },
}

impl InferenceError {
    pub fn runtime(provider: &str, source: ClientError) -> Self {
        InferenceError::Runtime {
            provider: provider.to_string(),
            source,
        }
    }
}

/// Trait for language model providers
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Run inference on a batch of prompts
    ///
    /// Returns one list of scored outputs per prompt, in prompt order.
    async fn infer(
        &self,
        batch_prompts: &[String],
        options: &InferenceOptions,
    ) -> Result<Vec<Vec<ScoredOutput>>, InferenceError>;

    /// Apply or clear a structured-output schema
    fn apply_schema(&mut self, schema: Option<&LlamaCppSchema>);

    /// The model identifier requests are sent with
    fn model_id(&self) -> &str;

    /// Get the provider name
    fn provider_name(&self) -> &str;
}
