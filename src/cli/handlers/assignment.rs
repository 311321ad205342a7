//! Handlers for `assign` and `unassign`

use super::base::HandlerContext;
use crate::core::UserId;
use crate::error::Result;

pub fn handle_assign(ticket_ref: &str, user: &str, ctx: &HandlerContext) -> Result<()> {
    let actor = ctx.actor()?;
    let id = ctx.resolve_ticket_ref(ticket_ref, &actor)?;
    let ticket = ctx.store.assign(&id, &UserId::from(user), &actor)?;

    if ctx.formatter.is_json() {
        ctx.formatter.print_json(&ticket)
    } else {
        ctx.success(&format!("Ticket {} assigned to {user}", ticket.id.short()));
        Ok(())
    }
}

pub fn handle_unassign(ticket_ref: &str, ctx: &HandlerContext) -> Result<()> {
    let actor = ctx.actor()?;
    let id = ctx.resolve_ticket_ref(ticket_ref, &actor)?;
    let ticket = ctx.store.unassign(&id, &actor)?;

    if ctx.formatter.is_json() {
        ctx.formatter.print_json(&ticket)
    } else {
        ctx.success(&format!("Ticket {} unassigned", ticket.id.short()));
        Ok(())
    }
}
