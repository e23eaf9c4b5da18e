//! llama.cpp provider plugin for LangExtract-style extraction pipelines
//!
//! Model identifiers beginning with `llama` are routed to a locally-run
//! llama.cpp server through its OpenAI-compatible API.

pub mod core;
pub mod models;

pub use crate::core::provider::{InferenceError, LanguageModel};
pub use crate::core::providers::LlamaCppProvider;
pub use crate::core::registry::ProviderRegistry;
pub use crate::core::schema::LlamaCppSchema;
pub use crate::models::inference::{InferenceOptions, ModelConfig, ProviderKwargs, ScoredOutput};
