//! Command-line interface
//!
//! Argument definitions live here; [`handlers`] turns parsed commands into
//! [`TicketStore`](crate::store::TicketStore) calls against the on-disk data
//! directory.

pub mod handlers;
mod output;

pub use output::OutputFormatter;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "ticket-desk",
    author,
    version,
    about = "Support ticket tracking with a full audit trail",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Data directory (defaults to the platform data directory)
    #[arg(long, global = true, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// Act as this user
    #[arg(long = "as", global = true, env = "TICKET_DESK_USER", value_name = "USER_ID")]
    pub acting_user: Option<String>,

    /// Output results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Manage the user directory
    User {
        #[command(subcommand)]
        command: UserCommands,
    },

    /// Create a ticket
    New {
        title: String,

        #[arg(short, long)]
        description: String,

        #[arg(short, long)]
        priority: String,

        /// Comma-separated tags
        #[arg(short, long, value_delimiter = ',')]
        tags: Vec<String>,

        /// Estimated hours
        #[arg(long)]
        estimate: Option<f64>,

        /// Due date (RFC 3339 or YYYY-MM-DD)
        #[arg(long)]
        due: Option<String>,
    },

    /// List tickets
    List {
        #[arg(short, long)]
        status: Option<String>,

        #[arg(short, long)]
        priority: Option<String>,

        #[arg(long)]
        author: Option<String>,

        #[arg(long)]
        assignee: Option<String>,

        /// Require this tag (repeatable)
        #[arg(long = "tag")]
        tags: Vec<String>,

        /// Match any of these words in title or description
        #[arg(long)]
        search: Option<String>,

        /// Treat --search as a regular expression
        #[arg(long, requires = "search")]
        regex: bool,

        /// Only overdue tickets
        #[arg(long)]
        overdue: bool,

        /// created, updated, priority, status, title or due
        #[arg(long, default_value = "created")]
        sort: String,

        #[arg(short, long)]
        reverse: bool,

        #[arg(long, default_value_t = 1)]
        page: usize,

        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Show one ticket
    Show {
        ticket: String,

        /// Include the audit history
        #[arg(long)]
        history: bool,

        /// Print user ids instead of resolving names
        #[arg(long)]
        raw: bool,
    },

    /// Change ticket fields
    Edit {
        ticket: String,

        #[arg(long)]
        title: Option<String>,

        #[arg(long)]
        description: Option<String>,

        #[arg(long)]
        status: Option<String>,

        #[arg(long)]
        priority: Option<String>,

        /// Replace all tags (comma-separated)
        #[arg(long, value_delimiter = ',')]
        tags: Option<Vec<String>>,

        #[arg(long)]
        estimate: Option<f64>,

        #[arg(long)]
        actual: Option<f64>,

        #[arg(long, conflicts_with = "clear_due")]
        due: Option<String>,

        #[arg(long)]
        clear_due: bool,

        /// Assign to user (admins only; ignored otherwise)
        #[arg(long)]
        assignee: Option<String>,
    },

    /// Delete a ticket permanently
    Delete { ticket: String },

    /// Manage comments
    Comment {
        #[command(subcommand)]
        command: CommentCommands,
    },

    /// Assign a ticket (admins only)
    Assign { ticket: String, user: String },

    /// Remove the assignee (admins only)
    Unassign { ticket: String },

    /// Show the audit history, newest first
    History { ticket: String },

    /// Ticket statistics (admins only)
    Stats,

    /// Overdue tickets, earliest due date first
    Overdue {
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Ticket counts per author (admins only)
    UserStats,
}

#[derive(Subcommand, Debug)]
pub enum UserCommands {
    /// Add or replace a user
    Add {
        id: String,

        #[arg(long)]
        name: String,

        #[arg(long)]
        email: String,

        #[arg(long)]
        admin: bool,
    },

    /// List users
    List,
}

#[derive(Subcommand, Debug)]
pub enum CommentCommands {
    /// Add a comment
    Add { ticket: String, content: String },

    /// Replace a comment's content
    Edit {
        ticket: String,
        comment: String,
        content: String,
    },

    /// Delete a comment
    Rm { ticket: String, comment: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "ticket-desk",
            "list",
            "--status",
            "pending",
            "--as",
            "alice",
            "--json",
        ])
        .unwrap();
        assert!(cli.json);
        assert_eq!(cli.acting_user.as_deref(), Some("alice"));
        assert!(matches!(cli.command, Commands::List { .. }));
    }

    #[test]
    fn test_new_splits_tags() {
        let cli = Cli::try_parse_from([
            "ticket-desk",
            "new",
            "Login broken",
            "-d",
            "Cannot log in since update",
            "-p",
            "high",
            "-t",
            "auth,web",
        ])
        .unwrap();
        match cli.command {
            Commands::New { tags, .. } => assert_eq!(tags, vec!["auth", "web"]),
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
