//! AI-Core CLI
//!
//! Command-line interface for managing provider keys, listing models,
//! inspecting usage stats and sending one-off chat requests

mod config;

use aicore_core::{
    normalized::{Message, RequestOptions},
    provider::mask_api_key,
    settings::SettingsUpdate,
};
use aicore_egress::model_fetcher::FetchKind;
use aicore_routing::AiCore;
use aicore_storage::{FileKeyValueStore, SettingsStore};
use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use config::CliConfig;
use std::sync::Arc;
use tracing::{Level, debug};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser)]
#[command(name = "aicore")]
#[command(about = "AI-Core - one interface to OpenAI, Anthropic, Gemini and OpenRouter", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to configuration file (YAML or TOML)
    #[arg(short, long, value_name = "FILE", env = "AICORE_CONFIG", global = true)]
    config: Option<String>,

    /// Directory holding settings and usage stats
    #[arg(long, value_name = "DIR", env = "AICORE_DATA_DIR", global = true)]
    data_dir: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, value_name = "LEVEL", env = "AICORE_LOG_LEVEL", global = true)]
    log_level: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show which providers hold a key
    Status,
    /// Store an API key for a provider (an empty key disables it)
    SetKey { provider: String, api_key: String },
    /// Check a provider's stored key against the vendor
    TestKey { provider: String },
    /// List known models
    Models {
        /// Only models served by this provider
        #[arg(long)]
        provider: Option<String>,

        /// Ask the provider for its live model list instead of the catalogue
        #[arg(long, requires = "provider")]
        live: bool,
    },
    /// Fetch live model listings from every provider holding a key
    FetchModels {
        #[arg(long, value_enum, default_value = "chat")]
        kind: ModelKind,
    },
    /// Send a single chat request
    Chat {
        prompt: String,

        /// Model id (defaults to the configured default model)
        #[arg(short, long)]
        model: Option<String>,

        /// Optional system prompt
        #[arg(short, long)]
        system: Option<String>,

        #[arg(long)]
        max_tokens: Option<u32>,

        #[arg(long)]
        temperature: Option<f32>,

        /// Application id recorded in usage stats
        #[arg(long)]
        app_id: Option<String>,
    },
    /// Show or change general settings
    Settings {
        #[arg(long)]
        default_provider: Option<String>,

        #[arg(long)]
        default_model: Option<String>,

        #[arg(long)]
        enable_stats: Option<bool>,
    },
    /// Show accumulated usage stats
    Stats,
    /// Zero the usage stats
    ResetStats,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ModelKind {
    Chat,
    Image,
}

impl From<ModelKind> for FetchKind {
    fn from(kind: ModelKind) -> Self {
        match kind {
            ModelKind::Chat => FetchKind::Chat,
            ModelKind::Image => FetchKind::Image,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => {
            let path = shellexpand::tilde(path).to_string();
            CliConfig::from_file(&path)
                .with_context(|| format!("Failed to load config file {}", path))?
        }
        None => CliConfig::default(),
    };
    config.merge_args(cli.data_dir.clone(), cli.log_level.clone());

    let log_level = match config.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::WARN,
    };
    // An explicit --log-level wins over RUST_LOG
    let filter = match (&cli.log_level, EnvFilter::try_from_default_env()) {
        (None, Ok(filter)) => filter,
        _ => EnvFilter::new(format!("{}", log_level)),
    };
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let data_dir = config.data_dir_path();
    debug!("Using data directory {:?}", data_dir);
    let kv = FileKeyValueStore::new(data_dir).await?;
    let store = Arc::new(SettingsStore::new(Arc::new(kv)));
    let core = AiCore::new(store, config.effective_endpoints()).await?;

    run(&core, cli.command).await
}

async fn run(core: &AiCore, command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Status => {
            let settings = core.get_settings().await;
            println!("Default model: {}", settings.chat_model());
            for (name, status) in core.get_provider_status() {
                let key = if status.configured {
                    status.api_key
                } else {
                    "-".to_string()
                };
                println!(
                    "{:<12} {:<14} {}",
                    name,
                    if status.configured {
                        "configured"
                    } else {
                        "not configured"
                    },
                    key
                );
            }
        }
        Commands::SetKey { provider, api_key } => {
            core.set_api_key(&provider, &api_key).await?;
            if api_key.is_empty() {
                println!("Removed API key for {}", provider);
            } else {
                println!("Saved API key for {}: {}", provider, mask_api_key(&api_key));
            }
        }
        Commands::TestKey { provider } => {
            if core.test_api_key(&provider).await? {
                println!("{}: API key is valid", provider);
            } else {
                anyhow::bail!("{}: API key test failed", provider);
            }
        }
        Commands::Models { provider, live } => {
            let models = match (provider, live) {
                (Some(provider), true) => core.get_available_models(&provider).await?,
                (Some(provider), false) => core.get_models_by_provider(&provider),
                (None, _) => core.get_all_models(),
            };
            for model in models {
                println!("{}", model);
            }
        }
        Commands::FetchModels { kind } => {
            for model in core.fetch_live_models(kind.into()).await {
                println!("{:<12} {:<40} {}", model.provider, model.id, model.display_name);
            }
        }
        Commands::Chat {
            prompt,
            model,
            system,
            max_tokens,
            temperature,
            app_id,
        } => {
            let model = match model {
                Some(model) => model,
                None => core.get_settings().await.chat_model().to_string(),
            };

            let mut messages = Vec::new();
            if let Some(system) = system {
                messages.push(Message::system(system));
            }
            messages.push(Message::user(prompt));

            let mut options = RequestOptions::new(&model);
            options.max_tokens = max_tokens;
            options.temperature = temperature;

            let response = core
                .send_text_request(&model, &messages, options, app_id.as_deref())
                .await?;
            let usage = AiCore::extract_usage(&response);

            println!("{}", AiCore::extract_content(&response));
            eprintln!(
                "[{}] {} prompt + {} completion = {} tokens",
                response.model, usage.prompt_tokens, usage.completion_tokens, usage.total_tokens
            );
        }
        Commands::Settings {
            default_provider,
            default_model,
            enable_stats,
        } => {
            let mut settings = core.get_settings().await;
            if default_provider.is_some() || default_model.is_some() || enable_stats.is_some() {
                settings = core
                    .update_settings(SettingsUpdate {
                        default_provider,
                        default_model,
                        enable_stats,
                        ..SettingsUpdate::default()
                    })
                    .await?;
            }

            for provider in settings.providers.values_mut() {
                provider.api_key = mask_api_key(&provider.api_key);
            }
            println!("{}", serde_json::to_string_pretty(&settings)?);
        }
        Commands::Stats => {
            let stats = core.get_stats().await?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
        Commands::ResetStats => {
            core.reset_stats().await?;
            println!("Usage stats reset");
        }
    }

    Ok(())
}
