//! llama.cpp HTTP client
//!
//! This module provides an async client for the OpenAI-compatible endpoints
//! exposed by `llama-server`: `/models` and `/chat/completions`.

use crate::models::openai::{ChatCompletionRequest, ChatCompletionResponse, ModelList};
use reqwest::{Client, Response};
use std::time::Duration;
use tracing::{debug, warn};

/// Error types that can occur while talking to the llama.cpp server
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Rate limit exceeded: {0}")]
    RateLimit(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Server unavailable: {0}")]
    Unavailable(String),

    #[error("API error (status {status}): {message}")]
    ApiError { status: u16, message: String },

    #[error("Empty response from server")]
    EmptyResponse,

    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

/// Async client for a single llama.cpp server
#[derive(Debug, Clone)]
pub struct LlamaCppClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl LlamaCppClient {
    /// Create a new client
    ///
    /// # Arguments
    ///
    /// * `api_key` - Bearer token presented to the server
    /// * `base_url` - Base URL of the OpenAI-compatible API
    /// * `timeout` - Request timeout in seconds
    pub fn new(api_key: String, base_url: &str, timeout: u64) -> Result<Self, ClientError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout))
            .build()
            .map_err(|e| {
                ClientError::Unexpected(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self {
            client,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// List the models served by this server
    pub async fn list_models(&self) -> Result<ModelList, ClientError> {
        let url = format!("{}/models", self.base_url);
        debug!("Listing models from {}", url);

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| ClientError::Unexpected(e.to_string()))?;

        let response = Self::check_status(response).await?;

        response
            .json()
            .await
            .map_err(|e| ClientError::Unexpected(format!("Failed to parse model list: {}", e)))
    }

    /// Send a non-streaming chat completion
    pub async fn create_chat_completion(
        &self,
        request: &ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse, ClientError> {
        let url = format!("{}/chat/completions", self.base_url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request.to_body())
            .send()
            .await
            .map_err(|e| ClientError::Unexpected(e.to_string()))?;

        let response = Self::check_status(response).await?;

        response
            .json()
            .await
            .map_err(|e| ClientError::Unexpected(format!("Failed to parse response: {}", e)))
    }

    /// Map non-success statuses onto `ClientError`
    async fn check_status(response: Response) -> Result<Response, ClientError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        let classified_error = Self::classify_error(&error_text);
        warn!("llama.cpp returned {}: {}", status, classified_error);

        Err(match status.as_u16() {
            401 | 403 => ClientError::Authentication(classified_error),
            429 => ClientError::RateLimit(classified_error),
            400 => ClientError::BadRequest(classified_error),
            503 => ClientError::Unavailable(classified_error),
            code => ClientError::ApiError {
                status: code,
                message: classified_error,
            },
        })
    }

    /// Classify llama.cpp errors and provide helpful messages
    fn classify_error(error_detail: &str) -> String {
        let error_lower = error_detail.to_lowercase();

        if error_lower.contains("invalid api key") || error_lower.contains("unauthorized") {
            return "Invalid API key. Please check your LLAMACPP_API_KEY configuration."
                .to_string();
        }

        if error_lower.contains("context size")
            || error_lower.contains("exceeds the available context")
        {
            return "Prompt exceeds the server context size. \
                    Restart llama-server with a larger --ctx-size or shorten the input."
                .to_string();
        }

        if error_lower.contains("loading model") {
            return "Model is still loading. Wait for llama-server to finish startup and try again."
                .to_string();
        }

        if error_lower.contains("model")
            && (error_lower.contains("not found") || error_lower.contains("does not exist"))
        {
            return "Model not found. \
                    Please check the model ID against the server's /models listing."
                .to_string();
        }

        error_detail.to_string()
    }
}
