use super::TicketStore;
use crate::core::{Ticket, UserId};
use crate::error::Result;
use crate::identity::UserSummary;
use crate::storage::TicketRepository;
use chrono::Utc;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// A ticket joined with display data for every user it references
///
/// Produced only on request by [`TicketStore::hydrate`]; the stored ticket
/// keeps bare [`UserId`] references.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HydratedTicket {
    #[serde(flatten)]
    pub ticket: Ticket,
    /// Known users by id; ids the directory cannot resolve are absent
    pub users: BTreeMap<UserId, UserSummary>,
    pub comments_count: usize,
    pub is_overdue: bool,
    pub time_to_resolve: Option<i64>,
}

impl HydratedTicket {
    pub fn user(&self, id: &UserId) -> Option<&UserSummary> {
        self.users.get(id)
    }

    pub fn author(&self) -> Option<&UserSummary> {
        self.user(&self.ticket.author)
    }

    pub fn assignee(&self) -> Option<&UserSummary> {
        self.ticket.assigned_to.as_ref().and_then(|id| self.user(id))
    }

    /// Name for display, falling back to the raw id
    pub fn display_name(&self, id: &UserId) -> String {
        self.user(id)
            .map_or_else(|| id.to_string(), |u| u.name.clone())
    }
}

impl<R: TicketRepository> TicketStore<R> {
    /// Resolve the author, assignee, comment authors and history users
    pub fn hydrate(&self, ticket: Ticket) -> Result<HydratedTicket> {
        let referenced: BTreeSet<&UserId> = std::iter::once(&ticket.author)
            .chain(ticket.assigned_to.as_ref())
            .chain(ticket.comments.iter().map(|c| &c.author))
            .chain(ticket.history.iter().map(|h| &h.user))
            .collect();

        let mut users = BTreeMap::new();
        for id in referenced {
            match self.identity.resolve(id)? {
                Some(profile) => {
                    users.insert(id.clone(), profile.summary());
                },
                None => tracing::debug!("User {id} referenced by ticket {} is unknown", ticket.id.short()),
            }
        }

        Ok(HydratedTicket {
            comments_count: ticket.comments_count(),
            is_overdue: ticket.is_overdue(Utc::now()),
            time_to_resolve: ticket.time_to_resolve(),
            users,
            ticket,
        })
    }
}
