//! lakedash CLI - warehouse dashboard service and maintenance commands
//!
//! This is the entry point for the `lakedash` command-line tool, which
//! provides:
//! - The HTTP API server (`serve` subcommand)
//! - Persisted connection-settings management (`config` subcommand)
//! - Database connectivity probe (`version` subcommand)
//! - Warehouse aggregations on the terminal (`fares`, `destinations`)

use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use lakedash_core::{credentials_from_env, TokenProvider};
use lakedash_server::{AppState, ServerConfig};
use lakedash_store::ConfigStore;
use tracing_subscriber::EnvFilter;

mod config;
mod queries;

#[derive(Parser, Debug)]
#[command(
    name = "lakedash",
    author,
    version,
    about = "Warehouse-backed taxi dashboard service",
    long_about = "Serve NYC taxi warehouse aggregations over HTTP, and manage the \
                  connection settings persisted in the Lakebase config table."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP API server
    Serve(ServeArgs),
    /// Manage persisted connection settings (get, set, show)
    Config(config::ConfigArgs),
    /// Check database connectivity and print the server version
    Version,
    /// Average fares and trip counts per pickup ZIP
    Fares(queries::FaresArgs),
    /// Busiest pickup/dropoff ZIP pairs
    Destinations(queries::DestinationsArgs),
}

#[derive(Parser, Debug)]
struct ServeArgs {
    /// Address to bind
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Port to listen on
    #[arg(long, default_value = "8000")]
    port: u16,
}

fn init_tracing() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .compact()
        .try_init()
        .map_err(|err| anyhow!(err))
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing().ok();
    lakedash_core::env::load_dotenv().ok();
    let cli = Cli::parse();

    // The store (and its connection pool) is built exactly once and passed
    // to whichever command needs it; connections are dialed lazily.
    let credentials = credentials_from_env()?;
    let store = ConfigStore::from_env(credentials.clone())
        .context("failed to build the config store (check PGHOST/PGDATABASE/PGUSER)")?;

    match cli.command {
        Commands::Serve(args) => run_serve(args, store, credentials).await?,
        Commands::Config(args) => config::run_config(args, &store).await?,
        Commands::Version => queries::run_version(&store).await?,
        Commands::Fares(args) => queries::run_fares(args, &store, credentials).await?,
        Commands::Destinations(args) => {
            queries::run_destinations(args, &store, credentials).await?
        }
    }
    Ok(())
}

async fn run_serve(
    args: ServeArgs,
    store: ConfigStore,
    credentials: Arc<dyn TokenProvider>,
) -> Result<()> {
    let state = AppState::new(store, credentials);
    lakedash_server::serve(
        state,
        ServerConfig {
            host: args.host,
            port: args.port,
        },
    )
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }
}
