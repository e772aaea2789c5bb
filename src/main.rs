mod config;
mod http;
mod server;
mod store;

use anyhow::Context;
use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

use config::{DEFAULT_ENV_FILE, EnvFile, RedisConfig};
use server::{DEFAULT_LISTEN_ADDR, Server};
use store::RedisStore;

/// HTTP gateway over Redis hashes
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Address to listen on
    #[arg(long, default_value = DEFAULT_LISTEN_ADDR)]
    listen: String,

    /// Env file with REDIS_* settings; `.env` is tried when omitted
    #[arg(long)]
    env_file: Option<PathBuf>,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    log_level: String,
}

/// Load the env file named on the command line, or `default` if it exists
fn load_env_file(path: Option<&Path>, default: &Path) -> anyhow::Result<Option<EnvFile>> {
    let file = match path {
        Some(path) => EnvFile::load(path)?,
        None if default.exists() => EnvFile::load(default)?,
        None => {
            warn!("No {} file found, using process environment only", default.display());
            return Ok(None);
        }
    };
    info!(vars = file.len(), "Loaded env file");
    Ok(Some(file))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&args.log_level)),
        )
        .with_target(true)
        .with_thread_ids(true)
        .init();

    info!("Starting hashgate - HTTP gateway over Redis hashes");

    let env_file = load_env_file(args.env_file.as_deref(), Path::new(DEFAULT_ENV_FILE))?;
    let redis_config =
        RedisConfig::from_env(env_file.as_ref()).context("Redis configuration is incomplete")?;
    info!(host = %redis_config.host, port = %redis_config.port, "Redis configuration");

    // One client for the whole process, shared by every handler
    let store = Arc::new(RedisStore::new(&redis_config).context("Failed to create Redis client")?);

    let server = Server::bind(&args.listen, store)
        .await
        .with_context(|| format!("Failed to bind {}", args.listen))?;
    info!("Server listening on: {}", server.local_addr());

    server
        .run(async {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Shutdown signal received");
            }
        })
        .await?;

    Ok(())
}
