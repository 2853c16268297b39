//! llmgate CLI — run the fallback gateway or send a one-shot request.
//!
//! Configuration is read once at startup from `~/.config/llmgate/config.toml`
//! (or `--config`) and the `OPENROUTER_*` / `MODEL_CANDIDATES` / `REQUEST_TIMEOUT_SEC` /
//! `MAX_OUTPUT_TOKENS` environment variables. Missing required values abort startup.

use std::num::NonZeroU64;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use colored::*;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use llmgate_core::config::GatewayConfig;
use llmgate_core::message::{ChatMessage, GenerateRequest};
use llmgate_core::orchestrator::GenerationResult;
use llmgate_hub::api::{self, ApiState};

// ─── CLI Definition ────────────────────────────────────────

/// llmgate — one endpoint, many models, ordered fallback.
#[derive(Parser)]
#[command(name = "llmgate", version, about, long_about = None)]
struct Cli {
    /// Config file (defaults to the user config dir)
    #[arg(short, long, global = true, env = "LLMGATE_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 🌐 Start the gateway HTTP server
    Serve {
        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Port to listen on
        #[arg(long, default_value_t = 8000)]
        port: u16,
    },

    /// ❓ Send a single prompt through the fallback chain
    Ask {
        /// The prompt to send
        prompt: String,

        /// Optional system message
        #[arg(short, long)]
        system: Option<String>,

        /// Requested output tokens (capped by MAX_OUTPUT_TOKENS)
        #[arg(long, default_value = "256")]
        max_tokens: NonZeroU64,
    },

    /// ⚙️ Inspect configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show the resolved configuration (credential masked)
    Show,
    /// Print the default config file path
    Path,
}

// ─── Main ──────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,llmgate_core=debug,llmgate_hub=debug")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { host, port } => {
            let config = GatewayConfig::load(cli.config.as_deref())?;
            run_serve(&config, &host, port).await?;
        }

        Commands::Ask {
            prompt,
            system,
            max_tokens,
        } => {
            let config = GatewayConfig::load(cli.config.as_deref())?;
            run_ask(&config, &prompt, system.as_deref(), max_tokens).await?;
        }

        Commands::Config { action } => match action {
            ConfigAction::Show => {
                let config = GatewayConfig::load(cli.config.as_deref())?;
                print!("{}", config.to_redacted_toml()?);
            }
            ConfigAction::Path => {
                println!("{}", GatewayConfig::default_path().display());
            }
        },
    }

    Ok(())
}

// ─── Serve ─────────────────────────────────────────────────

async fn run_serve(config: &GatewayConfig, host: &str, port: u16) -> anyhow::Result<()> {
    info!(
        "Upstream {} with {} candidate(s): {}",
        config.base_url,
        config.candidates.len(),
        config.candidates
    );
    warn!(
        "No overall request deadline; worst case per request is {:?} ({} × {:?})",
        config.worst_case_latency(),
        config.candidates.len(),
        config.request_timeout
    );

    let state = ApiState::from_config(config)?;
    api::start_server(state, host, port).await
}

// ─── Ask (one-shot) ────────────────────────────────────────

async fn run_ask(
    config: &GatewayConfig,
    prompt: &str,
    system: Option<&str>,
    max_tokens: NonZeroU64,
) -> anyhow::Result<()> {
    let state = ApiState::from_config(config)?;

    let mut messages = Vec::new();
    if let Some(system) = system {
        messages.push(ChatMessage::system(system));
    }
    messages.push(ChatMessage::user(prompt));

    let request = state.normalizer.normalize(GenerateRequest {
        messages,
        max_tokens,
    });
    let report = state
        .orchestrator
        .generate_with_report(&request, &state.candidates)
        .await;

    match report.result {
        GenerationResult::Success { text, model_used } => {
            println!("{}", text);
            eprintln!(
                "{} {} ({} attempt(s))",
                "model:".dimmed(),
                model_used.green(),
                report.attempts
            );
        }
        GenerationResult::Failure { error_kind } => {
            eprintln!(
                "{}: {} ({} attempt(s))",
                "Error".red(),
                error_kind,
                report.attempts
            );
            std::process::exit(1);
        }
    }

    Ok(())
}
