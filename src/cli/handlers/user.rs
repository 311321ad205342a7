//! Handlers for `user add|list`

use super::base::HandlerContext;
use crate::cli::UserCommands;
use crate::core::Role;
use crate::error::Result;
use crate::identity::UserProfile;

/// Directory maintenance is not gated on an acting user so that the first
/// administrator can be created.
pub fn handle_user_command(command: UserCommands, ctx: &HandlerContext) -> Result<()> {
    match command {
        UserCommands::Add {
            id,
            name,
            email,
            admin,
        } => {
            let role = if admin { Role::Admin } else { Role::User };
            let profile = UserProfile::new(id, name, email, role);
            ctx.directory.add(profile.clone())?;

            if ctx.formatter.is_json() {
                return ctx.formatter.print_json(&profile);
            }
            ctx.success(&format!("Saved user {} ({role})", profile.id));
        },
        UserCommands::List => {
            let users = ctx.directory.list()?;
            if ctx.formatter.is_json() {
                return ctx.formatter.print_json(&users);
            }
            if users.is_empty() {
                ctx.info("No users yet. Add one with 'ticket-desk user add'");
            }
            for user in &users {
                ctx.info(&format!("{:<16} {:<24} {:<28} {}", user.id, user.name, user.email, user.role));
            }
        },
    }
    Ok(())
}
