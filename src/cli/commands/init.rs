//! `ideaforge init`: write project configuration and initialize the database.

use anyhow::{Context as _, Result};
use clap::Args;
use std::path::Path;
use tracing::info;

use crate::infrastructure::config::ConfigLoader;

const CONFIG_DIR: &str = ".ideaforge";
const CONFIG_FILE: &str = ".ideaforge/config.yaml";

const CONFIG_TEMPLATE: &str = r#"# ideaforge project configuration.
# Values here override built-in defaults; IDEAFORGE_* environment
# variables override values here.

database:
  path: .ideaforge/ideaforge.db
  max_connections: 5

logging:
  level: info

experiment:
  iterations: 10
  sleep_interval_secs: 5
  exploration_constant: 1.0

mcts:
  iterations: 25
  exploration_constant: 1.0

evaluator:
  endpoint: http://127.0.0.1:8400/evaluate
  timeout_secs: 600

retry:
  max_retries: 3
  initial_backoff_ms: 500
  max_backoff_ms: 30000

contexts:
  - market: BTC-USD
    timeframe: 1h
  - market: BTC-USD
    timeframe: 4h
  - market: ETH-USD
    timeframe: 1h
  - market: ETH-USD
    timeframe: 4h
  - market: SPY
    timeframe: 1d

parameters:
  lookback: { min: 5, max: 200 }
  threshold: { min: 0.01, max: 0.10 }
  stop_loss: { min: 0.005, max: 0.05 }
  take_profit: { min: 0.01, max: 0.15 }
  position_size: { min: 0.01, max: 0.25 }
"#;

#[derive(Debug, Args)]
pub struct InitArgs {
    /// Overwrite an existing config file
    #[arg(long)]
    pub force: bool,
}

pub async fn execute(args: InitArgs, json: bool) -> Result<()> {
    let config_path = Path::new(CONFIG_FILE);
    let wrote_config = if config_path.exists() && !args.force {
        info!(path = CONFIG_FILE, "config exists; leaving it in place");
        false
    } else {
        std::fs::create_dir_all(CONFIG_DIR).context("Failed to create config directory")?;
        std::fs::write(config_path, CONFIG_TEMPLATE).context("Failed to write config file")?;
        true
    };

    let config = ConfigLoader::load()?;
    super::open_store(&config).await?;

    if json {
        println!(
            "{}",
            serde_json::json!({
                "config": CONFIG_FILE,
                "config_written": wrote_config,
                "database": config.database.path,
            })
        );
    } else {
        if wrote_config {
            println!("Wrote {CONFIG_FILE}");
        } else {
            println!("{CONFIG_FILE} already exists (use --force to overwrite)");
        }
        println!("Database initialized at {}", config.database.path);
    }
    Ok(())
}
