//! ticket-desk - support ticket tracking with a full audit trail
//!
//! This is the main entry point for the ticket-desk CLI application.
//! It handles command-line argument parsing and dispatches to the appropriate
//! command handlers.

use clap::Parser;
use std::process;
use ticket_desk::cli::handlers::{
    EditArgs, HandlerContext, ListArgs, NewTicketArgs, handle_assign, handle_comment_command,
    handle_delete, handle_edit, handle_history, handle_list, handle_new, handle_overdue,
    handle_show, handle_stats, handle_unassign, handle_user_command, handle_user_stats,
};
use ticket_desk::cli::{Cli, Commands, OutputFormatter};
use ticket_desk::config::Config;
use ticket_desk::error::{Result, TicketDeskError};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, Registry, fmt, reload};

/// Main entry point for the ticket-desk CLI
///
/// Parses command-line arguments and executes the requested command.
/// Handles errors gracefully and provides helpful error messages to users.
fn main() {
    let cli = Cli::parse();
    let formatter = OutputFormatter::new(cli.json, cli.no_color);
    let log_filter = init_logging(cli.verbose);

    if let Err(e) = run(cli, formatter, log_filter) {
        handle_error(&e, &formatter);
        process::exit(1);
    }
}

/// Run the CLI application with the parsed arguments
fn run(cli: Cli, formatter: OutputFormatter, log_filter: Option<LogFilterHandle>) -> Result<()> {
    let ctx = HandlerContext::new(cli.data_dir.as_deref(), cli.acting_user.as_deref(), formatter)?;
    if let Some(handle) = log_filter {
        apply_configured_level(&handle, &ctx.config);
    }

    dispatch_command(cli.command, &ctx)
}

type LogFilterHandle = reload::Handle<EnvFilter, Registry>;

/// Start logging before anything can fail
///
/// `--verbose` forces debug and `RUST_LOG` wins next; both pin the filter.
/// Otherwise the default level applies until the configuration is loaded,
/// and the returned handle swaps in the configured level.
fn init_logging(verbose: bool) -> Option<LogFilterHandle> {
    let (filter, pinned) = if verbose {
        (EnvFilter::new("debug"), true)
    } else {
        match EnvFilter::try_from_default_env() {
            Ok(filter) => (filter, true),
            Err(_) => (EnvFilter::new(&Config::default().logging.level), false),
        }
    };

    let (filter, handle) = reload::Layer::new(filter);
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
    (!pinned).then_some(handle)
}

fn apply_configured_level(handle: &LogFilterHandle, config: &Config) {
    match EnvFilter::try_new(&config.logging.level) {
        Ok(filter) => {
            if let Err(e) = handle.reload(filter) {
                tracing::warn!("Could not apply configured log level: {e}");
            }
        },
        Err(e) => tracing::warn!("Ignoring invalid log level '{}': {e}", config.logging.level),
    }
}

fn dispatch_command(command: Commands, ctx: &HandlerContext) -> Result<()> {
    match command {
        Commands::User { command } => handle_user_command(command, ctx),
        Commands::New {
            title,
            description,
            priority,
            tags,
            estimate,
            due,
        } => handle_new(
            NewTicketArgs {
                title,
                description,
                priority,
                tags,
                estimate,
                due,
            },
            ctx,
        ),
        Commands::List {
            status,
            priority,
            author,
            assignee,
            tags,
            search,
            regex,
            overdue,
            sort,
            reverse,
            page,
            limit,
        } => handle_list(
            ListArgs {
                status,
                priority,
                author,
                assignee,
                tags,
                search,
                regex,
                overdue,
                sort,
                reverse,
                page,
                limit,
            },
            ctx,
        ),
        Commands::Show { ticket, history, raw } => handle_show(&ticket, history, raw, ctx),
        Commands::Edit {
            ticket,
            title,
            description,
            status,
            priority,
            tags,
            estimate,
            actual,
            due,
            clear_due,
            assignee,
        } => handle_edit(
            EditArgs {
                ticket,
                title,
                description,
                status,
                priority,
                tags,
                estimate,
                actual,
                due,
                clear_due,
                assignee,
            },
            ctx,
        ),
        Commands::Delete { ticket } => handle_delete(&ticket, ctx),
        Commands::Comment { command } => handle_comment_command(command, ctx),
        Commands::Assign { ticket, user } => handle_assign(&ticket, &user, ctx),
        Commands::Unassign { ticket } => handle_unassign(&ticket, ctx),
        Commands::History { ticket } => handle_history(&ticket, ctx),
        Commands::Stats => handle_stats(ctx),
        Commands::Overdue { limit } => handle_overdue(limit, ctx),
        Commands::UserStats => handle_user_stats(ctx),
    }
}

/// Handle errors with user-friendly messages and suggestions
fn handle_error(error: &TicketDeskError, formatter: &OutputFormatter) {
    // In JSON mode, output error as JSON
    if formatter.is_json() {
        let _ = formatter.print_json(&serde_json::json!({
            "status": "error",
            "kind": error.kind(),
            "error": error.to_string(),
            "fields": error.field_errors(),
            "suggestions": error.suggestions(),
            "recoverable": error.is_recoverable(),
            "is_config_error": error.is_config_error(),
        }));
        return;
    }

    formatter.error(&error.user_message());

    let suggestions = error.suggestions();
    if !suggestions.is_empty() {
        eprintln!("\nSuggestions:");
        for suggestion in &suggestions {
            eprintln!("  • {suggestion}");
        }
    }

    // In verbose mode, show the full error chain
    if tracing::enabled!(tracing::Level::DEBUG) {
        eprintln!("\nDebug information:");
        eprintln!("{error:?}");
    }
}
