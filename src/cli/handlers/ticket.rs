//! Handlers for ticket lifecycle commands: `new`, `list`, `show`, `edit`,
//! `delete` and `history`

use super::base::{HandlerContext, format_datetime, parse};
use crate::core::{HistoryEntry, NewTicket, Priority, Status, Ticket, TicketPatch, UserId};
use crate::error::Result;
use crate::store::{HydratedTicket, Pagination, SortBy, TextSearch, TicketQuery};
use colored::Colorize;

/// Arguments of the `new` command
pub struct NewTicketArgs {
    pub title: String,
    pub description: String,
    pub priority: String,
    pub tags: Vec<String>,
    pub estimate: Option<f64>,
    pub due: Option<String>,
}

pub fn handle_new(args: NewTicketArgs, ctx: &HandlerContext) -> Result<()> {
    let actor = ctx.actor()?;
    let mut input = NewTicket::new(args.title, args.description, parse::value::<Priority>(&args.priority)?)
        .with_tags(args.tags);
    if let Some(hours) = args.estimate {
        input = input.with_estimated_time(hours);
    }
    if let Some(due) = args.due.as_deref() {
        input = input.with_due_date(parse::due_date(due)?);
    }

    let ticket = ctx.store.create(input, &actor)?;

    if ctx.formatter.is_json() {
        ctx.formatter.print_json(&ticket)?;
    } else {
        ctx.success(&format!("Created ticket {} '{}'", ticket.id.short(), ticket.title));
    }
    Ok(())
}

/// Arguments of the `list` command
pub struct ListArgs {
    pub status: Option<String>,
    pub priority: Option<String>,
    pub author: Option<String>,
    pub assignee: Option<String>,
    pub tags: Vec<String>,
    pub search: Option<String>,
    pub regex: bool,
    pub overdue: bool,
    pub sort: String,
    pub reverse: bool,
    pub page: usize,
    pub limit: Option<usize>,
}

pub fn handle_list(args: ListArgs, ctx: &HandlerContext) -> Result<()> {
    let actor = ctx.actor()?;

    let mut query = TicketQuery::new()
        .tags(args.tags)
        .sort_by(parse::value::<SortBy>(&args.sort)?, args.reverse);
    if let Some(status) = args.status.as_deref() {
        query = query.status(parse::value(status)?);
    }
    if let Some(priority) = args.priority.as_deref() {
        query = query.priority(parse::value(priority)?);
    }
    if let Some(author) = args.author {
        query = query.author(author);
    }
    if let Some(assignee) = args.assignee {
        query = query.assigned_to(assignee);
    }
    if let Some(search) = args.search.as_deref() {
        query = query.search(if args.regex {
            TextSearch::pattern(search)?
        } else {
            TextSearch::terms(search)
        });
    }
    if args.overdue {
        query = query.overdue_only();
    }

    let page = ctx.store.list(
        &query,
        Pagination {
            page: args.page,
            limit: args.limit,
        },
        &actor,
    )?;

    if ctx.formatter.is_json() {
        return ctx.formatter.print_json(&page);
    }

    if page.items.is_empty() {
        ctx.info("No tickets found");
        return Ok(());
    }
    for ticket in &page.items {
        print_ticket_line(ticket, ctx);
    }
    ctx.info(&format!(
        "\nPage {} of {} ({} ticket(s))",
        page.page,
        page.page_count.max(1),
        page.total
    ));
    Ok(())
}

pub fn handle_show(ticket_ref: &str, history: bool, raw: bool, ctx: &HandlerContext) -> Result<()> {
    let actor = ctx.actor()?;
    let id = ctx.resolve_ticket_ref(ticket_ref, &actor)?;
    let ticket = ctx.store.get(&id, &actor)?;

    if raw {
        if ctx.formatter.is_json() {
            return ctx.formatter.print_json(&ticket);
        }
        let hydrated = HydratedTicket {
            users: Default::default(),
            comments_count: ticket.comments_count(),
            is_overdue: ticket.is_overdue(chrono::Utc::now()),
            time_to_resolve: ticket.time_to_resolve(),
            ticket,
        };
        print_ticket_details(&hydrated, history, ctx);
        return Ok(());
    }

    let hydrated = ctx.store.hydrate(ticket)?;
    if ctx.formatter.is_json() {
        ctx.formatter.print_json(&hydrated)
    } else {
        print_ticket_details(&hydrated, history, ctx);
        Ok(())
    }
}

/// Arguments of the `edit` command
pub struct EditArgs {
    pub ticket: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<String>,
    pub priority: Option<String>,
    pub tags: Option<Vec<String>>,
    pub estimate: Option<f64>,
    pub actual: Option<f64>,
    pub due: Option<String>,
    pub clear_due: bool,
    pub assignee: Option<String>,
}

impl EditArgs {
    fn into_patch(self) -> Result<TicketPatch> {
        let mut patch = TicketPatch::new();
        if let Some(title) = self.title {
            patch = patch.title(title);
        }
        if let Some(description) = self.description {
            patch = patch.description(description);
        }
        if let Some(status) = self.status.as_deref() {
            patch = patch.status(parse::value::<Status>(status)?);
        }
        if let Some(priority) = self.priority.as_deref() {
            patch = patch.priority(parse::value::<Priority>(priority)?);
        }
        if let Some(tags) = self.tags {
            patch = patch.tags(tags);
        }
        if let Some(hours) = self.estimate {
            patch = patch.estimated_time(Some(hours));
        }
        if let Some(hours) = self.actual {
            patch = patch.actual_time(Some(hours));
        }
        if let Some(due) = self.due.as_deref() {
            patch = patch.due_date(Some(parse::due_date(due)?));
        }
        if self.clear_due {
            patch = patch.due_date(None);
        }
        if let Some(assignee) = self.assignee {
            patch = patch.assigned_to(Some(UserId::from(assignee)));
        }
        Ok(patch)
    }
}

pub fn handle_edit(args: EditArgs, ctx: &HandlerContext) -> Result<()> {
    let actor = ctx.actor()?;
    let id = ctx.resolve_ticket_ref(&args.ticket, &actor)?;
    let patch = args.into_patch()?;
    if patch.is_empty() {
        ctx.warning("Nothing to change");
        return Ok(());
    }

    let before = ctx.store.get(&id, &actor)?.history.len();
    let ticket = ctx.store.update(&id, patch, &actor)?;

    if ctx.formatter.is_json() {
        return ctx.formatter.print_json(&ticket);
    }
    let changes = &ticket.history[before.min(ticket.history.len())..];
    if changes.is_empty() {
        ctx.info(&format!("Ticket {} unchanged", ticket.id.short()));
    } else {
        ctx.success(&format!("Updated ticket {}", ticket.id.short()));
        for entry in changes {
            ctx.info(&format!("  {}", entry.description));
        }
    }
    Ok(())
}

pub fn handle_delete(ticket_ref: &str, ctx: &HandlerContext) -> Result<()> {
    let actor = ctx.actor()?;
    let id = ctx.resolve_ticket_ref(ticket_ref, &actor)?;
    let deleted = ctx.store.delete(&id, &actor)?;

    if ctx.formatter.is_json() {
        ctx.formatter.print_json(&deleted)
    } else {
        ctx.success(&format!("Deleted ticket {} '{}'", deleted.id.short(), deleted.title));
        Ok(())
    }
}

pub fn handle_history(ticket_ref: &str, ctx: &HandlerContext) -> Result<()> {
    let actor = ctx.actor()?;
    let id = ctx.resolve_ticket_ref(ticket_ref, &actor)?;
    let history = ctx.store.history(&id, &actor)?;

    if ctx.formatter.is_json() {
        return ctx.formatter.print_json(&history);
    }
    for entry in &history {
        print_history_entry(entry, &entry.user.to_string(), ctx);
    }
    Ok(())
}

pub(super) fn status_label(status: Status) -> colored::ColoredString {
    match status {
        Status::Pending => status.as_str().yellow(),
        Status::InProgress => status.as_str().cyan(),
        Status::Resolved => status.as_str().green(),
        Status::Closed => status.as_str().dimmed(),
    }
}

pub(super) fn priority_label(priority: Priority) -> colored::ColoredString {
    match priority {
        Priority::Low => priority.as_str().normal(),
        Priority::Medium => priority.as_str().blue(),
        Priority::High => priority.as_str().yellow().bold(),
        Priority::Critical => priority.as_str().red().bold(),
    }
}

pub(super) fn print_ticket_line(ticket: &Ticket, ctx: &HandlerContext) {
    let due = ticket
        .due_date
        .map(|d| format!(" due {}", format_datetime(d)))
        .unwrap_or_default();
    ctx.info(&format!(
        "{}  [{}] [{}] {}{}",
        ticket.id.short().bold(),
        status_label(ticket.status),
        priority_label(ticket.priority),
        ticket.title,
        due.dimmed()
    ));
}

fn print_ticket_details(hydrated: &HydratedTicket, history: bool, ctx: &HandlerContext) {
    let ticket = &hydrated.ticket;
    let out = &ctx.formatter;

    ctx.info(&format!("{} {}", ticket.id.short().bold(), ticket.title.bold()));
    out.field("ID", &ticket.id);
    out.field("Status", status_label(ticket.status));
    out.field("Priority", priority_label(ticket.priority));
    out.field("Author", hydrated.display_name(&ticket.author));
    if let Some(assignee) = &ticket.assigned_to {
        out.field("Assignee", hydrated.display_name(assignee));
    }
    if !ticket.tags.is_empty() {
        out.field("Tags", ticket.tags.join(", "));
    }
    if let Some(due) = ticket.due_date {
        let overdue = if hydrated.is_overdue { " (overdue)".red().to_string() } else { String::new() };
        out.field("Due", format!("{}{overdue}", format_datetime(due)));
    }
    if let Some(hours) = ticket.estimated_time {
        out.field("Estimate", format!("{hours}h"));
    }
    if let Some(hours) = ticket.actual_time {
        out.field("Actual", format!("{hours}h"));
    }
    out.field("Created", format_datetime(ticket.created_at));
    out.field("Updated", format_datetime(ticket.updated_at));
    if let Some(hours) = hydrated.time_to_resolve {
        out.field("Resolved in", format!("{hours}h"));
    }

    ctx.info(&format!("\n{}", ticket.description));

    if !ticket.comments.is_empty() {
        ctx.info(&format!("\nComments ({}):", hydrated.comments_count));
        for comment in &ticket.comments {
            let edited = if comment.is_edited { " (edited)" } else { "" };
            ctx.info(&format!(
                "  {} {} {}{}",
                comment.id.short().dimmed(),
                hydrated.display_name(&comment.author).bold(),
                format_datetime(comment.created_at).dimmed(),
                edited
            ));
            ctx.info(&format!("    {}", comment.content));
        }
    }

    if history {
        ctx.info("\nHistory:");
        for entry in ticket.history.iter().rev() {
            print_history_entry(entry, &hydrated.display_name(&entry.user), ctx);
        }
    }
}

fn print_history_entry(entry: &HistoryEntry, user: &str, ctx: &HandlerContext) {
    ctx.info(&format!(
        "  {} {:<16} {} ({})",
        format_datetime(entry.timestamp).dimmed(),
        entry.action.to_string().cyan(),
        entry.description,
        user
    ));
}
