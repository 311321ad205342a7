//! Access policy
//!
//! Pure predicates deciding what an [`Actor`] may do with a [`Ticket`].
//! Nothing here performs I/O; every predicate answers `false` unless a rule
//! explicitly grants access.

use crate::core::{Actor, Comment, Status, Ticket};

/// Admin, author or current assignee
pub fn can_view(actor: &Actor, ticket: &Ticket) -> bool {
    actor.is_admin() || ticket.author == actor.id || ticket.is_assigned_to(&actor.id)
}

/// Admin or author; covers both update and delete
pub fn can_modify(actor: &Actor, ticket: &Ticket) -> bool {
    actor.is_admin() || ticket.author == actor.id
}

/// Closed tickets only accept comments from admins
pub fn can_comment(actor: &Actor, ticket: &Ticket) -> bool {
    if actor.is_admin() {
        return true;
    }
    ticket.status != Status::Closed
        && (ticket.author == actor.id || ticket.is_assigned_to(&actor.id))
}

/// Only admins may change `assigned_to`
pub fn can_reassign(actor: &Actor) -> bool {
    actor.is_admin()
}

pub fn can_edit_comment(actor: &Actor, comment: &Comment) -> bool {
    actor.is_admin() || comment.author == actor.id
}

pub fn can_view_statistics(actor: &Actor) -> bool {
    actor.is_admin()
}
