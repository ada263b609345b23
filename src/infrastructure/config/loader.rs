use anyhow::{Context as _, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use thiserror::Error;

use crate::domain::models::Config;

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Database path cannot be empty")]
    EmptyDatabasePath,

    #[error("Invalid max_connections: {0}. Must be at least 1")]
    InvalidMaxConnections(u32),

    #[error("Invalid exploration constant: {0}. Must be non-negative and finite")]
    InvalidExplorationConstant(f64),

    #[error("Invalid iterations: 0. Must be at least 1")]
    InvalidIterations,

    #[error("No candidate contexts configured")]
    NoContexts,

    #[error("Invalid range for {0}: min must not exceed max")]
    InvalidRange(&'static str),

    #[error(
        "Invalid backoff configuration: initial_backoff_ms ({0}) must be less than max_backoff_ms ({1})"
    )]
    InvalidBackoff(u64, u64),
}

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with hierarchical merging.
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults
    /// 2. `.ideaforge/config.yaml` (project config, created by init)
    /// 3. `.ideaforge/local.yaml` (local overrides, optional)
    /// 4. Environment variables (`IDEAFORGE_*` prefix, highest priority)
    pub fn load() -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(".ideaforge/config.yaml"))
            .merge(Yaml::file(".ideaforge/local.yaml"))
            .merge(Env::prefixed("IDEAFORGE_").split("__"))
            .extract()
            .context("Failed to extract configuration from figment")?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific file.
    pub fn load_from_file(path: impl AsRef<std::path::Path>) -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(path.as_ref()))
            .extract()
            .context("Failed to extract configuration from file")?;

        Self::validate(&config)?;
        Ok(config)
    }

    fn validate(config: &Config) -> Result<(), ConfigError> {
        if config.database.path.is_empty() {
            return Err(ConfigError::EmptyDatabasePath);
        }
        if config.database.max_connections == 0 {
            return Err(ConfigError::InvalidMaxConnections(
                config.database.max_connections,
            ));
        }
        match config.logging.level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            other => return Err(ConfigError::InvalidLogLevel(other.to_string())),
        }

        for c in [
            config.experiment.exploration_constant,
            config.mcts.exploration_constant,
        ] {
            if !c.is_finite() || c < 0.0 {
                return Err(ConfigError::InvalidExplorationConstant(c));
            }
        }
        if config.experiment.iterations == 0 || config.mcts.iterations == 0 {
            return Err(ConfigError::InvalidIterations);
        }
        if config.contexts.is_empty() {
            return Err(ConfigError::NoContexts);
        }

        let p = &config.parameters;
        if p.lookback.min > p.lookback.max {
            return Err(ConfigError::InvalidRange("lookback"));
        }
        if p.threshold.min > p.threshold.max {
            return Err(ConfigError::InvalidRange("threshold"));
        }
        if p.stop_loss.min > p.stop_loss.max {
            return Err(ConfigError::InvalidRange("stop_loss"));
        }
        if p.take_profit.min > p.take_profit.max {
            return Err(ConfigError::InvalidRange("take_profit"));
        }
        if p.position_size.min > p.position_size.max {
            return Err(ConfigError::InvalidRange("position_size"));
        }

        if config.retry.initial_backoff_ms >= config.retry.max_backoff_ms {
            return Err(ConfigError::InvalidBackoff(
                config.retry.initial_backoff_ms,
                config.retry.max_backoff_ms,
            ));
        }

        Ok(())
    }
}
