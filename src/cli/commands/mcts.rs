//! `ideaforge mcts`: tree-structured exploration from a root idea.

use std::sync::Arc;

use anyhow::{Context as _, Result};
use clap::Args;
use tracing::info;

use crate::adapters::HttpEvaluator;
use crate::infrastructure::config::ConfigLoader;
use crate::services::MctsController;

#[derive(Debug, Args)]
pub struct MctsArgs {
    /// Root idea id the search tree grows from
    #[arg(long)]
    pub root: String,

    /// Number of MCTS iterations (overrides config)
    #[arg(long)]
    pub iterations: Option<u32>,

    /// Exploration constant (overrides config)
    #[arg(long)]
    pub exploration: Option<f64>,
}

pub async fn execute(args: MctsArgs, json: bool) -> Result<()> {
    let mut config = ConfigLoader::load()?;
    if let Some(iterations) = args.iterations {
        config.mcts.iterations = iterations;
    }
    if let Some(exploration) = args.exploration {
        config.mcts.exploration_constant = exploration;
    }

    let store = Arc::new(super::open_store(&config).await?);
    let evaluator = Arc::new(HttpEvaluator::new(&config.evaluator)?);
    let mut controller = MctsController::new(store, evaluator, &config);

    info!(
        root = %args.root,
        iterations = config.mcts.iterations,
        exploration = config.mcts.exploration_constant,
        "starting MCTS run"
    );
    let summary = controller
        .run(&args.root, config.mcts.iterations)
        .await
        .context("MCTS run failed")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!(
            "MCTS finished: {} iteration(s), {} node(s), {} evaluation failure(s)",
            summary.iterations, summary.nodes, summary.evaluation_failures
        );
        match &summary.best {
            Some(best) => println!(
                "Best child of root: {} (avg reward {:.4} over {} visit(s))",
                best.idea_id, best.average_reward, best.visits
            ),
            None => println!("No child of the root was successfully evaluated."),
        }
    }
    Ok(())
}
