use anyhow::Result;
use clap::{Parser, Subcommand};
use lakedash_core::{resolve_detailed, SettingName, SettingProvenance};
use lakedash_store::ConfigStore;

#[derive(Parser, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Get a persisted config value
    Get(GetArgs),
    /// Persist a config value (insert or overwrite)
    Set(SetArgs),
    /// Show effective connection settings and where each came from
    Show,
}

#[derive(Parser, Debug)]
pub struct GetArgs {
    /// Config key (e.g. "workspace", "warehouse")
    pub key: String,
}

#[derive(Parser, Debug)]
pub struct SetArgs {
    /// Config key (e.g. "workspace", "warehouse")
    pub key: String,

    /// Value to persist
    pub value: String,
}

pub async fn run_config(args: ConfigArgs, store: &ConfigStore) -> Result<()> {
    match args.command {
        ConfigCommands::Get(args) => run_get(args, store).await,
        ConfigCommands::Set(args) => run_set(args, store).await,
        ConfigCommands::Show => run_show(store).await,
    }
}

async fn run_get(args: GetArgs, store: &ConfigStore) -> Result<()> {
    match store.get(&args.key).await? {
        Some(value) => println!("{value}"),
        None => println!("(unset)"),
    }
    Ok(())
}

async fn run_set(args: SetArgs, store: &ConfigStore) -> Result<()> {
    store.set(&args.key, &args.value).await?;
    println!("{} = {}", args.key, args.value);
    Ok(())
}

async fn run_show(store: &ConfigStore) -> Result<()> {
    for name in [SettingName::Workspace, SettingName::Warehouse] {
        let resolved = resolve_detailed(store, name).await;
        let value = resolved.value.unwrap_or_else(|| "(unset)".to_string());
        let source = match resolved.source {
            SettingProvenance::Persisted => "persisted".to_string(),
            SettingProvenance::Environment => format!("environment ({})", name.env_var()),
            SettingProvenance::Unset => "unset".to_string(),
        };
        println!("{:<10} {:<40} {}", name.key(), value, source);
    }
    Ok(())
}
