//! Dispatch from a parsed `Cli` to the handler module for that command
//! (teacher crate's `commands::run` pattern).

use crate::args::{Cli, Commands, KnowledgeCommand};
use crate::handlers;
use anyhow::{anyhow, Result};
use clap::CommandFactory;
use ghost_core::ScmAdapter;

fn repo_root() -> Result<std::path::PathBuf> {
    let cwd = std::env::current_dir()?;
    ScmAdapter::new(&cwd).repo_root().ok_or_else(|| anyhow!("not inside a git repository"))
}

pub fn run(cli: Cli) -> Result<()> {
    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        println!();
        return Ok(());
    };

    match command {
        Commands::Enable { force, genesis } => handlers::enable::handle(&repo_root()?, force, genesis),
        Commands::Disable => handlers::enable::handle_disable(&repo_root()?),
        Commands::Reset => handlers::enable::handle_reset(&repo_root()?),
        Commands::Status => handlers::status::handle(&repo_root()?),
        Commands::Search { query, tags } => handlers::search::handle(&repo_root()?, &query, &tags),
        Commands::Log => handlers::log::handle(&repo_root()?),
        Commands::Show { commit } => handlers::show::handle(&repo_root()?, &commit),
        Commands::Tag { last, args } => handlers::tag::handle(&repo_root()?, last, &args),
        Commands::Knowledge { command } => {
            let root = repo_root()?;
            match command {
                KnowledgeCommand::Build => handlers::knowledge::build(&root),
                KnowledgeCommand::Inject => handlers::knowledge::inject(&root),
                KnowledgeCommand::Show => handlers::knowledge::show(&root),
                KnowledgeCommand::Diff => handlers::knowledge::diff(&root),
            }
        }
        Commands::Mistake { text } => handlers::mistake::handle(&repo_root()?, &text),
        Commands::Decisions { tag } => handlers::decisions::handle(&repo_root()?, tag.as_deref()),
        Commands::Resume { id } => handlers::resume::handle(&repo_root()?, id.as_deref()),
        Commands::Brief { text } => handlers::brief::handle(&repo_root()?, &text),
        Commands::Heatmap { tag, json, top } => {
            handlers::analytics::heatmap(&repo_root()?, tag.as_deref(), json, top)
        }
        Commands::Stats { tag, since, json, top } => {
            handlers::analytics::stats(&repo_root()?, tag.as_deref(), since.as_deref(), json, top)
        }
        Commands::Reindex => handlers::maintenance::reindex(&repo_root()?),
        Commands::Validate { fix } => handlers::maintenance::validate(&repo_root()?, fix),
        Commands::Update => handlers::maintenance::update(),
        Commands::Version => handlers::maintenance::version(),
    }
}
