//! Core data model: tickets, comments, history entries and patches

mod actor;
pub mod builders;
mod comment;
mod history;
mod id;
mod patch;
mod ticket;
pub mod validation;

pub use actor::{Actor, Role};
pub use comment::Comment;
pub use history::{FieldValue, HistoryAction, HistoryEntry, TrackedField};
pub(crate) use history::describe_value;
pub use id::{CommentId, TicketId, UserId};
pub use patch::{FieldUpdate, TicketPatch};
pub use ticket::{NewTicket, Priority, Status, Ticket};
