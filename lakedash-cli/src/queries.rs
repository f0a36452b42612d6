use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use lakedash_core::{resolve_connection_settings, TokenProvider};
use lakedash_store::ConfigStore;
use lakedash_warehouse::{
    fares_by_zip, top_destinations, WarehouseClient, WarehouseConfig,
    DEFAULT_DESTINATION_LIMIT, DEFAULT_TRIPS_TABLE,
};

#[derive(Parser, Debug)]
pub struct FaresArgs {
    /// Trips table to aggregate
    #[arg(long, default_value = DEFAULT_TRIPS_TABLE)]
    pub table: String,
}

#[derive(Parser, Debug)]
pub struct DestinationsArgs {
    /// Trips table to aggregate
    #[arg(long, default_value = DEFAULT_TRIPS_TABLE)]
    pub table: String,

    /// Maximum number of pickup/dropoff pairs to return
    #[arg(long, default_value_t = DEFAULT_DESTINATION_LIMIT)]
    pub limit: usize,
}

pub async fn run_version(store: &ConfigStore) -> Result<()> {
    let version = store.version().await?;
    println!("{version}");
    Ok(())
}

pub async fn run_fares(
    args: FaresArgs,
    store: &ConfigStore,
    credentials: Arc<dyn TokenProvider>,
) -> Result<()> {
    let client = warehouse_client(store, credentials).await?;
    let rows = fares_by_zip(&client, &args.table).await?;

    println!("{:<12} {:>12} {:>10}", "pickup_zip", "avg_fare", "count");
    for row in rows {
        println!(
            "{:<12} {:>12} {:>10}",
            display_text(&row.pickup_zip),
            display_fare(row.avg_fare),
            row.count
        );
    }
    Ok(())
}

pub async fn run_destinations(
    args: DestinationsArgs,
    store: &ConfigStore,
    credentials: Arc<dyn TokenProvider>,
) -> Result<()> {
    let client = warehouse_client(store, credentials).await?;
    let rows = top_destinations(&client, &args.table, args.limit).await?;

    println!(
        "{:<12} {:<12} {:>12} {:>10}",
        "pickup_zip", "dropoff_zip", "avg_fare", "count"
    );
    for row in rows {
        println!(
            "{:<12} {:<12} {:>12} {:>10}",
            display_text(&row.pickup_zip),
            display_text(&row.dropoff_zip),
            display_fare(row.avg_fare),
            row.count
        );
    }
    Ok(())
}

async fn warehouse_client(
    store: &ConfigStore,
    credentials: Arc<dyn TokenProvider>,
) -> Result<WarehouseClient> {
    let settings = resolve_connection_settings(store).await;

    let host = settings.workspace_host.context(
        "workspace host is not configured (set DATABRICKS_SERVER_HOSTNAME \
         or run `lakedash config set workspace ...`)",
    )?;
    let http_path = settings.warehouse_path.context(
        "warehouse path is not configured (set DATABRICKS_HTTP_PATH \
         or run `lakedash config set warehouse ...`)",
    )?;

    Ok(WarehouseClient::new(
        WarehouseConfig { host, http_path },
        credentials,
    )?)
}

fn display_text(value: &Option<String>) -> String {
    value.clone().unwrap_or_else(|| "-".to_string())
}

fn display_fare(fare: Option<f64>) -> String {
    fare.map(|f| format!("{f:.2}"))
        .unwrap_or_else(|| "-".to_string())
}
