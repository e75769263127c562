use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use coro_gateway::Config;
use coro_gateway::api::{ApiServer, ApiState};

/// Coro - conversation and speech gateway for a talking robot
#[derive(Parser)]
#[command(name = "coro", version, about)]
struct Cli {
    /// Host to bind
    #[arg(long, env = "HOST")]
    host: Option<String>,

    /// Port to listen on
    #[arg(long, env = "PORT")]
    port: Option<u16>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> ExitCode {
    // Missing .env is fine; the environment may already be populated
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "info,coro_gateway=info,tower_http=info",
        1 => "info,coro_gateway=debug,tower_http=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = Config::from_env()?;
    if let Some(host) = cli.host {
        config.host = host;
    }
    if let Some(port) = cli.port {
        config.port = port;
    }
    tracing::debug!(?config, "loaded configuration");

    tracing::info!(
        addr = %config.bind_addr(),
        tts = %config.tts.base_url,
        anthropic = config.anthropic.is_some(),
        openai = config.openai.is_some(),
        audio_dir = %config.audio.dir.display(),
        "starting coro gateway"
    );

    if config.anthropic.is_none() && config.openai.is_none() {
        tracing::warn!("no LLM credentials configured, replies will be canned");
    }

    let state = ApiState::from_config(&config).await?;
    ApiServer::new(Arc::new(state), config.bind_addr()).run().await?;

    Ok(())
}
