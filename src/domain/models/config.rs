//! Process configuration, loaded once at startup and immutable afterwards.

use serde::{Deserialize, Serialize};

/// Main configuration structure for ideaforge.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// Database configuration
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Flat UCB experiment loop configuration
    #[serde(default)]
    pub experiment: ExperimentConfig,

    /// MCTS mode configuration
    #[serde(default)]
    pub mcts: MctsConfig,

    /// Evaluator endpoint configuration
    #[serde(default)]
    pub evaluator: EvaluatorConfig,

    /// Store retry policy
    #[serde(default)]
    pub retry: RetryConfig,

    /// Candidate evaluation contexts the loop and MCTS expansion draw from
    #[serde(default = "default_contexts")]
    pub contexts: Vec<ContextConfig>,

    /// Valid ranges for scenario parameter draws
    #[serde(default)]
    pub parameters: ParamRanges,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: DatabaseConfig::default(),
            logging: LoggingConfig::default(),
            experiment: ExperimentConfig::default(),
            mcts: MctsConfig::default(),
            evaluator: EvaluatorConfig::default(),
            retry: RetryConfig::default(),
            contexts: default_contexts(),
            parameters: ParamRanges::default(),
        }
    }
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct DatabaseConfig {
    /// Path to `SQLite` database file
    #[serde(default = "default_database_path")]
    pub path: String,

    /// Maximum number of database connections in pool
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_database_path() -> String {
    ".ideaforge/ideaforge.db".to_string()
}

const fn default_max_connections() -> u32 {
    5
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
            max_connections: default_max_connections(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Flat experiment loop configuration; defaults for the run subcommand.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ExperimentConfig {
    /// Number of iterations before the loop terminates
    #[serde(default = "default_iterations")]
    pub iterations: u32,

    /// Seconds to sleep between iterations (not after the last)
    #[serde(default = "default_sleep_interval")]
    pub sleep_interval_secs: u64,

    /// UCB1 exploration constant `c`
    #[serde(default = "default_exploration")]
    pub exploration_constant: f64,
}

const fn default_iterations() -> u32 {
    10
}

const fn default_sleep_interval() -> u64 {
    5
}

const fn default_exploration() -> f64 {
    1.0
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            iterations: default_iterations(),
            sleep_interval_secs: default_sleep_interval(),
            exploration_constant: default_exploration(),
        }
    }
}

/// MCTS controller configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct MctsConfig {
    #[serde(default = "default_mcts_iterations")]
    pub iterations: u32,

    #[serde(default = "default_exploration")]
    pub exploration_constant: f64,
}

const fn default_mcts_iterations() -> u32 {
    25
}

impl Default for MctsConfig {
    fn default() -> Self {
        Self {
            iterations: default_mcts_iterations(),
            exploration_constant: default_exploration(),
        }
    }
}

/// Evaluator endpoint configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct EvaluatorConfig {
    /// HTTP endpoint the evaluator adapter posts evaluation requests to
    #[serde(default = "default_evaluator_endpoint")]
    pub endpoint: String,

    /// Request timeout in seconds; evaluations can take minutes
    #[serde(default = "default_evaluator_timeout")]
    pub timeout_secs: u64,
}

fn default_evaluator_endpoint() -> String {
    "http://127.0.0.1:8400/evaluate".to_string()
}

const fn default_evaluator_timeout() -> u64 {
    600
}

impl Default for EvaluatorConfig {
    fn default() -> Self {
        Self {
            endpoint: default_evaluator_endpoint(),
            timeout_secs: default_evaluator_timeout(),
        }
    }
}

/// Retry policy for store failures inside the loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RetryConfig {
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,

    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
}

const fn default_max_retries() -> u32 {
    3
}

const fn default_initial_backoff_ms() -> u64 {
    500
}

const fn default_max_backoff_ms() -> u64 {
    30_000
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
        }
    }
}

impl RetryConfig {
    /// Exponential backoff delay for the given zero-based attempt, capped.
    pub fn backoff_for_attempt(&self, attempt: u32) -> std::time::Duration {
        let exp = self
            .initial_backoff_ms
            .saturating_mul(1u64 << attempt.min(16));
        std::time::Duration::from_millis(exp.min(self.max_backoff_ms))
    }
}

/// One candidate evaluation context.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ContextConfig {
    pub market: String,
    pub timeframe: String,
}

fn default_contexts() -> Vec<ContextConfig> {
    [
        ("BTC-USD", "1h"),
        ("BTC-USD", "4h"),
        ("ETH-USD", "1h"),
        ("ETH-USD", "4h"),
        ("SPY", "1d"),
    ]
    .into_iter()
    .map(|(market, timeframe)| ContextConfig {
        market: market.to_string(),
        timeframe: timeframe.to_string(),
    })
    .collect()
}

/// Inclusive numeric range for a scenario knob.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Range<T> {
    pub min: T,
    pub max: T,
}

/// Valid ranges for each scenario parameter.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ParamRanges {
    #[serde(default = "default_lookback_range")]
    pub lookback: Range<u32>,

    #[serde(default = "default_threshold_range")]
    pub threshold: Range<f64>,

    #[serde(default = "default_stop_loss_range")]
    pub stop_loss: Range<f64>,

    #[serde(default = "default_take_profit_range")]
    pub take_profit: Range<f64>,

    #[serde(default = "default_position_size_range")]
    pub position_size: Range<f64>,
}

const fn default_lookback_range() -> Range<u32> {
    Range { min: 5, max: 200 }
}

const fn default_threshold_range() -> Range<f64> {
    Range { min: 0.01, max: 0.10 }
}

const fn default_stop_loss_range() -> Range<f64> {
    Range { min: 0.005, max: 0.05 }
}

const fn default_take_profit_range() -> Range<f64> {
    Range { min: 0.01, max: 0.15 }
}

const fn default_position_size_range() -> Range<f64> {
    Range { min: 0.01, max: 0.25 }
}

impl Default for ParamRanges {
    fn default() -> Self {
        Self {
            lookback: default_lookback_range(),
            threshold: default_threshold_range(),
            stop_loss: default_stop_loss_range(),
            take_profit: default_take_profit_range(),
            position_size: default_position_size_range(),
        }
    }
}
