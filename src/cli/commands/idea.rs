//! `ideaforge idea`: author and inspect ideas.

use anyhow::{bail, Context as _, Result};
use clap::{Args, Subcommand};

use crate::cli::output::{format_backtest_table, format_idea_table};
use crate::domain::models::{Idea, RelationKind};
use crate::domain::ports::MemoryStore;
use crate::infrastructure::config::ConfigLoader;

#[derive(Debug, Args)]
pub struct IdeaArgs {
    #[command(subcommand)]
    pub command: IdeaCommands,
}

#[derive(Debug, Subcommand)]
pub enum IdeaCommands {
    /// Add a new idea
    Add {
        /// Natural-language description of the trading heuristic
        description: String,
        /// Explicit id (generated when omitted)
        #[arg(long)]
        id: Option<String>,
    },
    /// List all ideas with their statistics
    List,
    /// Show one idea and its backtest history
    Show { id: String },
    /// Record that one idea is a derived variation of another
    Link {
        /// The derived idea
        child: String,
        /// The idea it was derived from
        parent: String,
    },
}

pub async fn execute(args: IdeaArgs, json: bool) -> Result<()> {
    let config = ConfigLoader::load()?;
    let store = super::open_store(&config).await?;

    match args.command {
        IdeaCommands::Add { description, id } => {
            let idea = match id {
                Some(id) => Idea::with_id(id, description),
                None => Idea::new(description),
            };
            store
                .upsert_idea(&idea)
                .await
                .context("Failed to store idea")?;
            if json {
                println!("{}", serde_json::to_string_pretty(&idea)?);
            } else {
                println!("Added idea {}", idea.id);
            }
        }
        IdeaCommands::List => {
            let ideas = store.list_ideas().await.context("Failed to list ideas")?;
            if json {
                println!("{}", serde_json::to_string_pretty(&ideas)?);
            } else if ideas.is_empty() {
                println!("No ideas yet. Add one with `ideaforge idea add`.");
            } else {
                println!("{}", format_idea_table(&ideas));
            }
        }
        IdeaCommands::Show { id } => {
            let Some(idea) = store.get_idea(&id).await.context("Failed to load idea")? else {
                bail!("Idea not found: {id}");
            };
            let backtests = store
                .backtests_for_idea(&id)
                .await
                .context("Failed to load backtests")?;
            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&serde_json::json!({
                        "idea": idea,
                        "backtests": backtests,
                    }))?
                );
            } else {
                println!("{}", format_idea_table(std::slice::from_ref(&idea)));
                if backtests.is_empty() {
                    println!("No backtests recorded.");
                } else {
                    println!("{}", format_backtest_table(&backtests));
                }
            }
        }
        IdeaCommands::Link { child, parent } => {
            for id in [&child, &parent] {
                if store.get_idea(id).await?.is_none() {
                    bail!("Idea not found: {id}");
                }
            }
            store
                .relate(&child, RelationKind::SubideaOf, &parent)
                .await
                .context("Failed to record relationship")?;
            if json {
                println!(
                    "{}",
                    serde_json::json!({ "child": child, "relation": "SUBIDEA_OF", "parent": parent })
                );
            } else {
                println!("{child} -SUBIDEA_OF-> {parent}");
            }
        }
    }
    Ok(())
}
