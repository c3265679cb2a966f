//! Command-line surface. The seven hook events and the hidden
//! `finalize-worker` re-entry point are *not* modeled here: they're
//! intercepted by raw argv matching in `main` before `Cli::parse` ever runs
//! (see `hooks::is_hook_command`), since a malformed flag in that path must
//! never produce a clap usage error on the host agent's stderr.

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "ghost")]
#[command(
    about = "Local, durable session capture and knowledge mining for coding-agent sessions",
    long_about = None
)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Install hook wiring and create the session directory tree")]
    Enable {
        #[arg(short = 'f', long, help = "Install without prompting for confirmation")]
        force: bool,
        #[arg(long, help = "Also seed the co-mod graph and knowledge base from existing history")]
        genesis: bool,
    },

    #[command(about = "Remove this system's hook entries, leaving session files untouched")]
    Disable,

    #[command(about = "Wipe the session directory, the notes ref, and the external search collection")]
    Reset,

    #[command(about = "Report active session, completed count, background pid, and hook wiring")]
    Status,

    #[command(about = "Delegate a query to the external semantic-search engine")]
    Search {
        query: String,
        #[arg(long = "tag")]
        tags: Vec<String>,
    },

    #[command(about = "List up to 20 most recent completed sessions")]
    Log,

    #[command(about = "Print the note attached to a commit")]
    Show { commit: String },

    #[command(
        about = "Apply tags to a session",
        long_about = "Apply tags to a session: `ghost tag <id> <tags...>` targets an explicit \
session id; `ghost tag --last <tags...>` targets the most recently completed session instead."
    )]
    Tag {
        #[arg(long, help = "Target the most recently completed session instead of an explicit id")]
        last: bool,
        #[arg(required = true, num_args = 1.., help = "[id] tag...")]
        args: Vec<String>,
    },

    #[command(about = "Aggregate, inject, show, or diff shared knowledge")]
    Knowledge {
        #[command(subcommand)]
        command: KnowledgeCommand,
    },

    #[command(about = "Record a manual mistake entry")]
    Mistake { text: String },

    #[command(about = "List recorded decisions")]
    Decisions {
        #[arg(long)]
        tag: Option<String>,
    },

    #[command(about = "Print a continuity block for the most recent (or a named) session")]
    Resume { id: Option<String> },

    #[command(about = "Print a relevance-scoped knowledge brief for a topic")]
    Brief { text: String },

    #[command(about = "Show mistakes ranked as a co-modification heatmap")]
    Heatmap {
        #[arg(long)]
        tag: Option<String>,
        #[arg(long)]
        json: bool,
        #[arg(long, default_value_t = 10)]
        top: usize,
    },

    #[command(about = "Show knowledge-store statistics")]
    Stats {
        #[arg(long)]
        tag: Option<String>,
        #[arg(long)]
        since: Option<String>,
        #[arg(long)]
        json: bool,
        #[arg(long, default_value_t = 10)]
        top: usize,
    },

    #[command(about = "Rebuild the external search index from completed sessions")]
    Reindex,

    #[command(about = "Validate the on-disk session store, optionally repairing it")]
    Validate {
        #[arg(short = 'f', long)]
        fix: bool,
    },

    #[command(about = "Report the installed version and configured install method")]
    Update,

    #[command(about = "Print version information")]
    Version,
}

#[derive(Subcommand)]
pub enum KnowledgeCommand {
    #[command(about = "Aggregate completed-session summaries into knowledge.md/decisions.md/mistakes.md")]
    Build,
    #[command(about = "Append the current top knowledge into the agent-visible context file")]
    Inject,
    #[command(about = "Print the aggregated knowledge files")]
    Show,
    #[command(about = "Diff local knowledge against the synced orphan branch")]
    Diff,
}
