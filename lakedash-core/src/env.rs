//! `.env` loading for local development.
//!
//! Priority order (highest to lowest):
//! 1. Current directory `.env`
//! 2. `~/.lakedash/.env`
//! 3. Environment variables already set
//!
//! dotenvy never overwrites variables that are already set, so loading both
//! files in this order is safe.

use anyhow::Result;
use tracing::{debug, info};

/// Load environment variables from `.env` files. Missing files are fine.
pub fn load_dotenv() -> Result<()> {
    let mut loaded_from = Vec::new();

    if let Ok(path) = dotenvy::dotenv() {
        loaded_from.push(format!("current directory ({})", path.display()));
        debug!("loaded .env from current directory: {}", path.display());
    }

    if let Some(home_dir) = dirs::home_dir() {
        let env_file = home_dir.join(".lakedash").join(".env");
        if env_file.exists() {
            match dotenvy::from_path(&env_file) {
                Ok(_) => {
                    loaded_from.push(format!("~/.lakedash/.env ({})", env_file.display()));
                    debug!("loaded .env from ~/.lakedash: {}", env_file.display());
                }
                Err(err) => {
                    debug!("failed to load ~/.lakedash/.env: {}", err);
                }
            }
        }
    }

    if loaded_from.is_empty() {
        debug!("no .env files found (current dir or ~/.lakedash)");
    } else {
        info!("loaded configuration from: {}", loaded_from.join(", "));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_dotenv_doesnt_panic() {
        // Should never panic, even if no .env exists.
        assert!(load_dotenv().is_ok());
    }
}
