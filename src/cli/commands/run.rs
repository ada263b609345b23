//! `ideaforge run`: the flat UCB1 experiment loop.

use std::sync::Arc;

use anyhow::{Context as _, Result};
use clap::Args;
use tokio::sync::broadcast;
use tracing::info;

use crate::adapters::HttpEvaluator;
use crate::application::ExperimentLoop;
use crate::infrastructure::config::ConfigLoader;

#[derive(Debug, Args)]
pub struct RunArgs {
    /// Number of iterations (overrides config)
    #[arg(long)]
    pub iterations: Option<u32>,

    /// Seconds to sleep between iterations (overrides config)
    #[arg(long)]
    pub interval: Option<u64>,

    /// UCB1 exploration constant (overrides config)
    #[arg(long)]
    pub exploration: Option<f64>,
}

pub async fn execute(args: RunArgs, json: bool) -> Result<()> {
    let mut config = ConfigLoader::load()?;
    if let Some(iterations) = args.iterations {
        config.experiment.iterations = iterations;
    }
    if let Some(interval) = args.interval {
        config.experiment.sleep_interval_secs = interval;
    }
    if let Some(exploration) = args.exploration {
        config.experiment.exploration_constant = exploration;
    }

    let store = Arc::new(super::open_store(&config).await?);
    let evaluator = Arc::new(HttpEvaluator::new(&config.evaluator)?);
    let experiment = ExperimentLoop::new(store, evaluator, &config);

    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("ctrl-c received; shutting down after the current iteration");
            let _ = shutdown_tx.send(());
        }
    });

    info!(
        iterations = config.experiment.iterations,
        interval_secs = config.experiment.sleep_interval_secs,
        exploration = config.experiment.exploration_constant,
        "starting experiment loop"
    );
    let summary = experiment
        .run(shutdown_rx)
        .await
        .context("Experiment loop failed")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!(
            "Completed {} iteration(s): {} evaluated, {} evaluation failure(s), {} skipped{}",
            summary.completed + summary.evaluation_failures + summary.skipped,
            summary.completed,
            summary.evaluation_failures,
            summary.skipped,
            if summary.cancelled { " (cancelled)" } else { "" },
        );
    }
    Ok(())
}
