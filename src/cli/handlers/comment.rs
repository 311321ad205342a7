//! Handlers for `comment add|edit|rm`

use super::base::{HandlerContext, resolve_comment_ref};
use crate::cli::CommentCommands;
use crate::error::Result;

pub fn handle_comment_command(command: CommentCommands, ctx: &HandlerContext) -> Result<()> {
    let actor = ctx.actor()?;

    match command {
        CommentCommands::Add { ticket, content } => {
            let id = ctx.resolve_ticket_ref(&ticket, &actor)?;
            let ticket = ctx.store.add_comment(&id, &content, &actor)?;
            if ctx.formatter.is_json() {
                return ctx.formatter.print_json(&ticket.comments.last());
            }
            ctx.success(&format!(
                "Comment added to ticket {} ({} total)",
                ticket.id.short(),
                ticket.comments_count()
            ));
        },
        CommentCommands::Edit {
            ticket,
            comment,
            content,
        } => {
            let id = ctx.resolve_ticket_ref(&ticket, &actor)?;
            let loaded = ctx.store.get(&id, &actor)?;
            let comment_id = resolve_comment_ref(&loaded, &comment)?;
            let edited = ctx.store.update_comment(&id, &comment_id, &content, &actor)?;
            if ctx.formatter.is_json() {
                return ctx.formatter.print_json(&edited);
            }
            ctx.success(&format!("Comment {} updated", edited.id.short()));
        },
        CommentCommands::Rm { ticket, comment } => {
            let id = ctx.resolve_ticket_ref(&ticket, &actor)?;
            let loaded = ctx.store.get(&id, &actor)?;
            let comment_id = resolve_comment_ref(&loaded, &comment)?;
            ctx.store.delete_comment(&id, &comment_id, &actor)?;
            if ctx.formatter.is_json() {
                return ctx.formatter.print_json(&serde_json::json!({
                    "status": "deleted",
                    "ticket": id,
                    "comment": comment_id,
                }));
            }
            ctx.success(&format!("Comment {} deleted", comment_id.short()));
        },
    }
    Ok(())
}
