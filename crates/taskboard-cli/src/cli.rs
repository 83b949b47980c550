use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use taskboard_domain::Priority;

#[derive(Parser)]
#[command(name = "taskboard")]
#[command(about = "A kanban task board with AI-assisted priorities", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Path to the SQLite database (or set TASKBOARD_DB env var)
    #[arg(long, value_name = "PATH", env = "TASKBOARD_DB", global = true)]
    pub db: Option<PathBuf>,

    /// Use a throwaway in-memory board
    #[arg(long, global = true, conflicts_with = "db")]
    pub memory: bool,

    /// Never call the remote classifier; use the keyword heuristic
    #[arg(long, global = true)]
    pub offline: bool,

    /// Print JSON instead of text
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print every list with its cards
    Show,
    /// List operations
    List(ListCommand),
    /// Card operations
    Card(CardCommand),
}

// List commands
#[derive(Args)]
pub struct ListCommand {
    #[command(subcommand)]
    pub action: ListAction,
}

#[derive(Subcommand)]
pub enum ListAction {
    /// Add a list at the end of the board
    Add {
        #[arg(long)]
        title: String,
    },
    /// Rename a list
    Rename {
        #[arg(long)]
        id: i64,
        #[arg(long)]
        title: String,
    },
    /// Delete a list and all of its cards
    Delete {
        #[arg(long)]
        id: i64,
    },
}

// Card commands
#[derive(Args)]
pub struct CardCommand {
    #[command(subcommand)]
    pub action: CardAction,
}

#[derive(Subcommand)]
pub enum CardAction {
    /// Add a card at the end of a list
    Add {
        #[arg(long)]
        list: i64,
        #[arg(long)]
        title: String,
        #[arg(long)]
        description: Option<String>,
    },
    /// Change a card's title or description
    Edit(CardEditArgs),
    /// Delete a card
    Delete {
        #[arg(long)]
        id: i64,
    },
    /// Move a card to a list, at an index or at the end
    Move {
        #[arg(long)]
        id: i64,
        #[arg(long)]
        to_list: i64,
        #[arg(long)]
        index: Option<usize>,
    },
    /// Set a card's priority (low, medium or high)
    Priority {
        #[arg(long)]
        id: i64,
        #[arg(value_name = "LEVEL")]
        level: Priority,
    },
    /// Set a card's group label, or clear it when no label is given
    Group {
        #[arg(long)]
        id: i64,
        #[arg(long)]
        label: Option<String>,
    },
}

#[derive(Args)]
pub struct CardEditArgs {
    #[arg(long)]
    pub id: i64,
    #[arg(long)]
    pub title: Option<String>,
    #[arg(long, conflicts_with = "clear_description")]
    pub description: Option<String>,
    #[arg(long)]
    pub clear_description: bool,
}
