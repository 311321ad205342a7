//! Handlers for `stats`, `overdue` and `user-stats`

use super::base::{HandlerContext, format_datetime};
use super::ticket::{print_ticket_line, priority_label, status_label};
use crate::core::{Priority, Status};
use crate::error::Result;
use crate::stats::TicketSummary;
use colored::Colorize;

pub fn handle_stats(ctx: &HandlerContext) -> Result<()> {
    let actor = ctx.actor()?;
    let stats = ctx.store.statistics(&actor)?;

    if ctx.formatter.is_json() {
        return ctx.formatter.print_json(&stats);
    }

    ctx.info(&"Ticket statistics".bold().to_string());
    ctx.formatter.field("Total", stats.total);
    ctx.formatter.field("Overdue", stats.overdue_count);

    ctx.info("\nBy status:");
    for status in Status::ALL {
        ctx.info(&format!("  {:<14} {}", status_label(status), stats.by_status.get(status)));
    }
    ctx.info("\nBy priority:");
    for priority in Priority::ALL.into_iter().rev() {
        ctx.info(&format!(
            "  {:<14} {}",
            priority_label(priority),
            stats.by_priority.get(priority)
        ));
    }

    if !stats.recent_tickets.is_empty() {
        ctx.info("\nRecent tickets:");
        for summary in &stats.recent_tickets {
            print_summary(summary, ctx);
        }
    }
    if !stats.overdue_tickets.is_empty() {
        ctx.info("\nOverdue tickets:");
        for summary in &stats.overdue_tickets {
            print_summary(summary, ctx);
        }
    }
    Ok(())
}

pub fn handle_overdue(limit: Option<usize>, ctx: &HandlerContext) -> Result<()> {
    let actor = ctx.actor()?;
    let tickets = ctx.store.overdue(limit, &actor)?;

    if ctx.formatter.is_json() {
        return ctx.formatter.print_json(&tickets);
    }
    if tickets.is_empty() {
        ctx.info("No overdue tickets");
    }
    for ticket in &tickets {
        print_ticket_line(ticket, ctx);
    }
    Ok(())
}

pub fn handle_user_stats(ctx: &HandlerContext) -> Result<()> {
    let actor = ctx.actor()?;
    let rows = ctx.store.user_stats(&actor)?;

    if ctx.formatter.is_json() {
        return ctx.formatter.print_json(&rows);
    }
    ctx.info(&format!(
        "{:<24} {:>6} {:>6} {:>9}",
        "Author".bold(),
        "Total".bold(),
        "Open".bold(),
        "Resolved".bold()
    ));
    for row in &rows {
        let name = row.name.clone().unwrap_or_else(|| row.author.to_string());
        ctx.info(&format!(
            "{:<24} {:>6} {:>6} {:>9}",
            name, row.total, row.open, row.resolved
        ));
    }
    Ok(())
}

fn print_summary(summary: &TicketSummary, ctx: &HandlerContext) {
    let due = summary
        .due_date
        .map(|d| format!(" due {}", format_datetime(d)))
        .unwrap_or_default();
    ctx.info(&format!(
        "  {} [{}] {}{}",
        summary.id.short().bold(),
        status_label(summary.status),
        summary.title,
        due.dimmed()
    ));
}
