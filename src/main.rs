//! llama.cpp extraction provider CLI
//!
//! Routes prompts through the provider registry to a local llama.cpp server
//! and prints one JSON line per prompt.

use clap::Parser;
use langextract_llamacpp::core::client::LlamaCppClient;
use langextract_llamacpp::core::config::Config;
use langextract_llamacpp::core::constants::{defaults, provider};
use langextract_llamacpp::core::logging::init_logging;
use langextract_llamacpp::{InferenceOptions, ModelConfig, ProviderRegistry};
use serde_json::json;
use std::path::PathBuf;
use tokio::io::AsyncReadExt;
use tracing::{error, info};

#[derive(Parser)]
#[command(author, version, about = "Run prompts through a local llama.cpp server")]
struct Cli {
    /// Model ID; routed by pattern, or the first served model when unset
    #[arg(long)]
    model_id: Option<String>,

    /// Provider name or alias, bypassing pattern routing
    #[arg(long)]
    provider: Option<String>,

    /// TOML configuration file
    #[arg(long, env = "CONFIG_PATH", default_value = defaults::CONFIG_FILE)]
    config: PathBuf,

    /// OpenAI-compatible API base URL
    #[arg(long)]
    base_url: Option<String>,

    #[arg(long)]
    system_prompt: Option<String>,

    #[arg(long)]
    temperature: Option<f32>,

    #[arg(long)]
    max_tokens: Option<u32>,

    /// Concurrent requests per batch
    #[arg(long)]
    max_workers: Option<usize>,

    /// List the server's models and exit
    #[arg(long)]
    list_models: bool,

    /// Prompts to run; one prompt is read from stdin when none are given
    prompts: Vec<String>,
}

impl Cli {
    fn apply_to(&self, config: &mut Config) {
        if let Some(ref model_id) = self.model_id {
            config.model_id = Some(model_id.clone());
        }
        if let Some(ref base_url) = self.base_url {
            config.base_url = base_url.clone();
        }
        if let Some(ref system_prompt) = self.system_prompt {
            config.system_prompt = system_prompt.clone();
        }
        if let Some(temperature) = self.temperature {
            config.temperature = temperature;
        }
        if let Some(max_tokens) = self.max_tokens {
            config.max_tokens = max_tokens;
        }
        if let Some(max_workers) = self.max_workers {
            config.max_workers = max_workers;
        }
    }
}

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    // Load configuration
    let config = match Config::load(&cli.config).and_then(|mut cfg| {
        cli.apply_to(&mut cfg);
        cfg.validate()?;
        Ok(cfg)
    }) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration Error: {:#}", e);
            std::process::exit(1);
        }
    };

    init_logging(&config.log_level);

    if let Err(e) = run(cli, config).await {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli, config: Config) -> anyhow::Result<()> {
    if cli.list_models {
        let client = LlamaCppClient::new(
            config.api_key.clone().unwrap_or_else(|| defaults::API_KEY.to_string()),
            &config.base_url,
            config.request_timeout,
        )?;
        for model in client.list_models().await?.data {
            println!("{}", model.id);
        }
        return Ok(());
    }

    let prompts = if cli.prompts.is_empty() {
        let mut input = String::new();
        tokio::io::stdin().read_to_string(&mut input).await?;
        vec![input]
    } else {
        cli.prompts.clone()
    };

    // Without a model ID there is nothing to route on, so pick llama.cpp.
    let provider_name = match (&cli.provider, &config.model_id) {
        (Some(name), _) => Some(name.clone()),
        (None, None) => Some(provider::NAME.to_string()),
        (None, Some(_)) => None,
    };

    let registry = ProviderRegistry::with_builtin();
    let model = registry
        .create_model(ModelConfig {
            model_id: config.model_id.clone(),
            provider: provider_name,
            provider_kwargs: config.provider_kwargs(),
        })
        .await?;

    info!(
        "Running {} prompt(s) on {} via {}",
        prompts.len(),
        model.model_id(),
        model.provider_name()
    );

    let results = model.infer(&prompts, &InferenceOptions::default()).await?;
    for (index, outputs) in results.iter().enumerate() {
        println!("{}", json!({ "prompt_index": index, "outputs": outputs }));
    }

    Ok(())
}
