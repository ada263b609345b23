//! ideaforge CLI entry point.

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use ideaforge::cli::{Cli, Commands};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Init(args) => ideaforge::cli::commands::init::execute(args, cli.json).await,
        Commands::Idea(args) => ideaforge::cli::commands::idea::execute(args, cli.json).await,
        Commands::Run(args) => ideaforge::cli::commands::run::execute(args, cli.json).await,
        Commands::Mcts(args) => ideaforge::cli::commands::mcts::execute(args, cli.json).await,
    };

    if let Err(err) = result {
        ideaforge::cli::handle_error(err, cli.json);
    }
}
