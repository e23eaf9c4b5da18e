//! llama.cpp provider implementation

use crate::core::client::{ClientError, LlamaCppClient};
use crate::core::constants::{defaults, env, provider, role};
use crate::core::provider::{InferenceError, LanguageModel};
use crate::core::schema::LlamaCppSchema;
use crate::models::inference::{InferenceOptions, ProviderKwargs, ScoredOutput};
use crate::models::openai::{ChatCompletionRequest, ChatMessage, ResponseFormat};
use async_trait::async_trait;
use futures::{StreamExt, TryStreamExt, stream};
use serde_json::Value;
use tracing::{debug, info};
use uuid::Uuid;

/// Pick the first non-empty value among an explicit setting and an
/// environment value, falling back to `default`
pub fn resolve_setting(
    explicit: Option<String>,
    env_value: Option<String>,
    default: &str,
) -> String {
    explicit
        .filter(|v| !v.is_empty())
        .or_else(|| env_value.filter(|v| !v.is_empty()))
        .unwrap_or_else(|| default.to_string())
}

/// Language model backed by a llama.cpp server
pub struct LlamaCppProvider {
    client: LlamaCppClient,
    model_id: String,
    system_prompt: String,
    temperature: f32,
    max_tokens: u32,
    max_workers: usize,
    response_schema: Option<Value>,
    structured_output: bool,
}

impl std::fmt::Debug for LlamaCppProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlamaCppProvider")
            .field("base_url", &self.client.base_url())
            .field("model_id", &self.model_id)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("max_workers", &self.max_workers)
            .field("structured_output", &self.structured_output)
            .finish()
    }
}

impl LlamaCppProvider {
    /// Create a provider, reading unset credentials from the environment
    ///
    /// When no model ID is given the first model listed by the server is
    /// used.
    ///
    /// # Errors
    ///
    /// Returns `InferenceError::Config` if the HTTP client cannot be built or
    /// the server lists no models, and `InferenceError::Runtime` if listing
    /// models fails.
    pub async fn new(kwargs: ProviderKwargs) -> Result<Self, InferenceError> {
        let api_key = resolve_setting(
            kwargs.api_key,
            std::env::var(env::API_KEY).ok(),
            defaults::API_KEY,
        );
        let base_url = resolve_setting(
            kwargs.base_url,
            std::env::var(env::API_BASE).ok(),
            defaults::BASE_URL,
        );
        let timeout = kwargs.request_timeout.unwrap_or(defaults::REQUEST_TIMEOUT);

        let client = LlamaCppClient::new(api_key, &base_url, timeout)
            .map_err(|e| InferenceError::Config(e.to_string()))?;

        let model_id = match kwargs.model_id.filter(|m| !m.is_empty()) {
            Some(model_id) => model_id,
            None => Self::first_served_model(&client).await?,
        };

        info!(
            "Created llama.cpp provider: model={}, base_url={}",
            model_id,
            client.base_url()
        );

        Ok(Self {
            client,
            model_id,
            system_prompt: kwargs.system_prompt.unwrap_or_default(),
            temperature: kwargs.temperature.unwrap_or(defaults::TEMPERATURE),
            max_tokens: kwargs.max_tokens.unwrap_or(defaults::MAX_TOKENS),
            max_workers: kwargs.max_workers.unwrap_or(defaults::MAX_WORKERS).max(1),
            response_schema: kwargs.response_schema,
            structured_output: kwargs.structured_output,
        })
    }

    async fn first_served_model(client: &LlamaCppClient) -> Result<String, InferenceError> {
        let models = client
            .list_models()
            .await
            .map_err(|e| InferenceError::runtime(provider::DISPLAY_NAME, e))?;

        models
            .data
            .into_iter()
            .next()
            .map(|m| m.id)
            .ok_or_else(|| InferenceError::Config("No models available from server".to_string()))
    }

    pub fn structured_output(&self) -> bool {
        self.structured_output
    }

    /// Build the chat completion request for a single prompt
    pub fn build_request(&self, prompt: &str, options: &InferenceOptions) -> ChatCompletionRequest {
        let mut messages = Vec::with_capacity(2);
        if !self.system_prompt.is_empty() {
            messages.push(ChatMessage::new(role::SYSTEM, self.system_prompt.as_str()));
        }
        messages.push(ChatMessage::new(role::USER, prompt));

        let response_format = match (&self.response_schema, self.structured_output) {
            (Some(schema), true) => Some(ResponseFormat::json_schema(schema.clone())),
            _ => None,
        };

        ChatCompletionRequest {
            model: self.model_id.clone(),
            messages,
            temperature: Some(options.temperature.unwrap_or(self.temperature)),
            max_tokens: Some(options.max_output_tokens.unwrap_or(self.max_tokens)),
            top_p: options.top_p,
            response_format,
            extra: options.extra.clone(),
        }
    }

    async fn infer_one(
        &self,
        prompt: &str,
        options: &InferenceOptions,
    ) -> Result<Vec<ScoredOutput>, InferenceError> {
        let request_id = Uuid::new_v4();
        let request = self.build_request(prompt, options);

        debug!(
            "Sending chat completion: request_id={}, model={}, prompt_chars={}",
            request_id,
            self.model_id,
            prompt.chars().count()
        );

        let response = self
            .client
            .create_chat_completion(&request)
            .await
            .map_err(|e| InferenceError::runtime(provider::DISPLAY_NAME, e))?;

        let output = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| {
                InferenceError::runtime(provider::DISPLAY_NAME, ClientError::EmptyResponse)
            })?;

        debug!(
            "Received completion: request_id={}, output_chars={}",
            request_id,
            output.chars().count()
        );

        Ok(vec![ScoredOutput {
            score: 1.0,
            output: output.trim().to_string(),
        }])
    }
}

#[async_trait]
impl LanguageModel for LlamaCppProvider {
    async fn infer(
        &self,
        batch_prompts: &[String],
        options: &InferenceOptions,
    ) -> Result<Vec<Vec<ScoredOutput>>, InferenceError> {
        if batch_prompts.is_empty() {
            return Ok(Vec::new());
        }

        // Futures are lazy, so `buffered` still bounds in-flight requests.
        let pending: Vec<_> = batch_prompts
            .iter()
            .map(|prompt| self.infer_one(prompt, options))
            .collect();

        stream::iter(pending)
            .buffered(self.max_workers)
            .try_collect()
            .await
    }

    fn apply_schema(&mut self, schema: Option<&LlamaCppSchema>) {
        match schema.map(LlamaCppSchema::to_provider_config) {
            Some(config) => {
                self.response_schema = Some(config.response_schema);
                self.structured_output = config.structured_output;
            }
            None => {
                self.response_schema = None;
                self.structured_output = false;
            }
        }
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }

    fn provider_name(&self) -> &str {
        provider::DISPLAY_NAME
    }
}
