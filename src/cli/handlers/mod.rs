//! Command handlers
//!
//! Each handler receives a [`HandlerContext`] that owns the store for the
//! selected data directory and knows the acting user.

mod assignment;
mod base;
mod comment;
mod report;
mod ticket;
mod user;

pub use assignment::{handle_assign, handle_unassign};
pub use base::{HandlerContext, format_datetime, resolve_comment_ref};
pub use comment::handle_comment_command;
pub use report::{handle_overdue, handle_stats, handle_user_stats};
pub use ticket::{
    EditArgs, ListArgs, NewTicketArgs, handle_delete, handle_edit, handle_history, handle_list,
    handle_new, handle_show,
};
pub use user::handle_user_command;
