//! Command-line interface.

pub mod commands;
pub mod output;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "ideaforge",
    about = "Idea exploration and scoring engine for trading strategies",
    version
)]
pub struct Cli {
    /// Emit JSON instead of human-readable output
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Create project configuration and initialize the database
    Init(commands::init::InitArgs),
    /// Author and inspect ideas
    Idea(commands::idea::IdeaArgs),
    /// Run the flat UCB1 experiment loop
    Run(commands::run::RunArgs),
    /// Run MCTS exploration from a root idea
    Mcts(commands::mcts::MctsArgs),
}

/// Print an error in the requested format and exit non-zero.
pub fn handle_error(err: anyhow::Error, json: bool) {
    if json {
        println!(
            "{}",
            serde_json::json!({ "error": format!("{err:#}") })
        );
    } else {
        eprintln!("Error: {err:#}");
    }
    std::process::exit(1);
}
