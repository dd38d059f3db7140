//! desk-server - HTTP entry point for the analysis service

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use desk_api::{AppState, serve};
use desk_engine::NodeConfig;
use desk_jobs::{JobDispatcher, JobStore};
use desk_llm::ModelClient;
use desk_llm::providers::{AnthropicClient, OpenAIClient, OpenAIConfig};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "desk-server")]
#[command(about = "Analysis job server for desk-rs", long_about = None)]
struct Args {
    /// Port to listen on
    #[arg(short, long, default_value_t = 8000)]
    port: u16,

    /// Default model provider (openai or anthropic)
    #[arg(long, default_value = "openai")]
    provider: String,

    /// Model identifier passed to the provider
    #[arg(long, default_value = "gpt-4o")]
    model: String,

    /// Treat the OpenAI-compatible endpoint as needing a continuation
    /// turn after tool results (Google-style endpoints)
    #[arg(long, default_value_t = false)]
    tool_continuation: bool,

    /// How many analysis pipelines may run concurrently
    #[arg(long, default_value_t = desk_jobs::dispatcher::DEFAULT_MAX_CONCURRENT_JOBS)]
    max_concurrent_jobs: usize,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    desk_utils::init_tracing();

    let args = Args::parse();
    info!(provider = %args.provider, model = %args.model, "starting desk-server");

    let default_client: Arc<dyn ModelClient> = match args.provider.as_str() {
        "anthropic" => Arc::new(
            AnthropicClient::from_env().context("anthropic client configuration")?,
        ),
        "openai" => {
            let config =
                OpenAIConfig::from_env().context("openai client configuration")?;
            Arc::new(
                OpenAIClient::with_config(config.with_tool_continuation(args.tool_continuation))
                    .context("openai client construction")?,
            )
        }
        other => anyhow::bail!("unknown provider: {other}"),
    };

    let node_config = NodeConfig {
        model: args.model,
        ..NodeConfig::default()
    };

    let mut dispatcher = JobDispatcher::new(
        Arc::new(JobStore::new()),
        Arc::new(desk_tools::default_registry()),
        default_client,
        node_config,
    )
    .with_max_concurrent_jobs(args.max_concurrent_jobs);

    // Make the other provider selectable per request when its key is around
    if args.provider != "anthropic" {
        if let Ok(client) = AnthropicClient::from_env() {
            dispatcher.register_client(Arc::new(client));
            info!("anthropic registered as secondary provider");
        }
    }
    if args.provider != "openai" {
        if let Ok(client) = OpenAIClient::from_env() {
            dispatcher.register_client(Arc::new(client));
            info!("openai registered as secondary provider");
        }
    }

    serve(Arc::new(AppState { dispatcher }), args.port).await
}
