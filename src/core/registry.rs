//! Provider registry
//!
//! Maps model identifier patterns to provider factories. A model ID is
//! routed to the highest-priority provider with a matching pattern.

use crate::core::constants::provider;
use crate::core::provider::{InferenceError, LanguageModel};
use crate::core::providers::LlamaCppProvider;
use crate::models::inference::{ModelConfig, ProviderKwargs};
use futures::FutureExt;
use futures::future::BoxFuture;
use regex::Regex;
use std::sync::Arc;
use tracing::debug;

/// Pending provider construction
pub type ModelFuture = BoxFuture<'static, Result<Box<dyn LanguageModel>, InferenceError>>;

/// Builds a provider from its construction arguments
pub type ProviderFactory = Arc<dyn Fn(ProviderKwargs) -> ModelFuture + Send + Sync>;

/// A registered provider
pub struct RegistryEntry {
    name: String,
    aliases: Vec<String>,
    patterns: Vec<Regex>,
    priority: i32,
    factory: ProviderFactory,
}

impl RegistryEntry {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Unanchored search, so patterns need an explicit `^` to anchor
    pub fn matches(&self, model_id: &str) -> bool {
        self.patterns.iter().any(|p| p.is_match(model_id))
    }

    fn answers_to(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
            || self.aliases.iter().any(|a| a.eq_ignore_ascii_case(name))
    }
}

/// Registry of model-ID patterns to providers
#[derive(Default)]
pub struct ProviderRegistry {
    entries: Vec<RegistryEntry>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the llama.cpp provider registered for `^llama`
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        let factory: ProviderFactory = Arc::new(|kwargs: ProviderKwargs| -> ModelFuture {
            async move {
                let model = LlamaCppProvider::new(kwargs).await?;
                Ok::<_, InferenceError>(Box::new(model) as Box<dyn LanguageModel>)
            }
            .boxed()
        });

        // The builtin pattern is a constant and always compiles.
        if let Err(e) = registry.register(
            provider::NAME,
            &[provider::ALIAS],
            &[provider::MODEL_PATTERN],
            provider::PRIORITY,
            factory,
        ) {
            tracing::error!("Failed to register builtin provider: {}", e);
        }
        registry
    }

    /// Register a provider for the given patterns
    ///
    /// # Errors
    ///
    /// Returns `InferenceError::Config` if a pattern is not a valid regex.
    pub fn register(
        &mut self,
        name: &str,
        aliases: &[&str],
        patterns: &[&str],
        priority: i32,
        factory: ProviderFactory,
    ) -> Result<(), InferenceError> {
        let patterns = patterns
            .iter()
            .map(|p| {
                Regex::new(p).map_err(|e| {
                    InferenceError::Config(format!("Invalid pattern {:?} for {}: {}", p, name, e))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        debug!("Registered provider {} with priority {}", name, priority);

        self.entries.push(RegistryEntry {
            name: name.to_string(),
            aliases: aliases.iter().map(|a| a.to_string()).collect(),
            patterns,
            priority,
            factory,
        });
        Ok(())
    }

    /// Find the provider responsible for a model ID
    ///
    /// Higher priority wins; on a tie the earliest registration wins.
    pub fn resolve(&self, model_id: &str) -> Result<&RegistryEntry, InferenceError> {
        let mut best: Option<&RegistryEntry> = None;
        for entry in self.entries.iter().filter(|e| e.matches(model_id)) {
            if best.is_none_or(|b| entry.priority > b.priority) {
                best = Some(entry);
            }
        }

        best.inspect(|entry| debug!("Resolved model_id={} to {}", model_id, entry.name))
            .ok_or_else(|| {
                InferenceError::Config(format!(
                    "No provider registered for model_id={:?}",
                    model_id
                ))
            })
    }

    /// Find a provider by name or alias, ignoring case
    pub fn resolve_provider(&self, name: &str) -> Result<&RegistryEntry, InferenceError> {
        self.entries
            .iter()
            .find(|e| e.answers_to(name))
            .ok_or_else(|| InferenceError::Config(format!("Unknown provider: {}", name)))
    }

    /// Whether the named provider accepts this model ID
    pub fn supports(&self, name: &str, model_id: &str) -> bool {
        self.resolve_provider(name)
            .map(|e| e.matches(model_id))
            .unwrap_or(false)
    }

    /// Resolve and construct a model
    ///
    /// An explicit provider takes precedence over pattern routing. The
    /// configured model ID is forwarded unless the kwargs already set one.
    pub async fn create_model(
        &self,
        config: ModelConfig,
    ) -> Result<Box<dyn LanguageModel>, InferenceError> {
        let entry = match (&config.provider, &config.model_id) {
            (Some(name), _) => self.resolve_provider(name)?,
            (None, Some(model_id)) => self.resolve(model_id)?,
            (None, None) => {
                return Err(InferenceError::Config(
                    "Either model_id or provider must be specified".to_string(),
                ));
            }
        };

        let mut kwargs = config.provider_kwargs;
        if kwargs.model_id.is_none() {
            kwargs.model_id = config.model_id;
        }

        (entry.factory)(kwargs).await
    }
}
