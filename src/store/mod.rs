//! Ticket store
//!
//! [`TicketStore`] is the only writer of tickets. Every mutating operation
//! follows the same shape:
//!
//! 1. load the ticket as currently persisted
//! 2. check permissions, then validate input (nothing is written on failure)
//! 3. apply the change and append history through [`crate::audit`]
//! 4. bump [`Ticket::version`] and compare-and-swap it back
//!
//! If step 4 loses a race the whole cycle is re-run against the fresh
//! document, so two writers can never diff against the same "before" state.

mod comments;
mod hydrate;
mod query;
mod reports;

pub use hydrate::HydratedTicket;
pub use query::{Page, Pagination, SortBy, TextSearch, TicketQuery};

use crate::audit;
use crate::core::validation::{validate_new_ticket, validate_patch};
use crate::core::{
    Actor, FieldUpdate, HistoryEntry, NewTicket, Status, Ticket, TicketId, TicketPatch, TrackedField,
    UserId,
};
use crate::error::{Result, TicketDeskError};
use crate::identity::IdentityResolver;
use crate::policy;
use crate::rate_limit::RateLimiter;
use crate::storage::TicketRepository;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;

/// Tunables for a [`TicketStore`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreOptions {
    pub default_page_size: usize,
    pub max_page_size: usize,
    pub user_stats_limit: usize,
    pub recent_tickets_limit: usize,
    pub overdue_preview_limit: usize,
    /// Extra attempts after a lost compare-and-swap
    pub max_conflict_retries: u32,
}

impl Default for StoreOptions {
    fn default() -> Self {
        crate::config::Config::default().store_options()
    }
}

/// Confirmation returned by [`TicketStore::delete`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeletedTicket {
    pub id: TicketId,
    pub title: String,
}

/// Result of applying an operation to a loaded ticket
pub(crate) enum Outcome<T> {
    /// Nothing changed; skip the write
    Unchanged(T),
    /// The ticket was modified and must be persisted
    Changed(T),
}

/// Ticket lifecycle operations over a repository
pub struct TicketStore<R> {
    repo: R,
    identity: Arc<dyn IdentityResolver>,
    options: StoreOptions,
    limiter: Option<RateLimiter>,
}

impl<R> std::fmt::Debug for TicketStore<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TicketStore")
            .field("options", &self.options)
            .field("rate_limited", &self.limiter.is_some())
            .finish_non_exhaustive()
    }
}

impl<R: TicketRepository> TicketStore<R> {
    pub fn new(repo: R, identity: Arc<dyn IdentityResolver>) -> Self {
        Self {
            repo,
            identity,
            options: StoreOptions::default(),
            limiter: None,
        }
    }

    #[must_use]
    pub fn with_options(mut self, options: StoreOptions) -> Self {
        self.options = options;
        self
    }

    /// Throttle mutating operations per actor
    #[must_use]
    pub fn with_rate_limiter(mut self, limiter: RateLimiter) -> Self {
        self.limiter = Some(limiter);
        self
    }

    pub const fn repository(&self) -> &R {
        &self.repo
    }

    pub const fn options(&self) -> &StoreOptions {
        &self.options
    }

    pub fn identity(&self) -> &dyn IdentityResolver {
        self.identity.as_ref()
    }

    fn throttle(&self, actor: &Actor) -> Result<()> {
        match &self.limiter {
            Some(limiter) => limiter.check(actor.id.as_str()),
            None => Ok(()),
        }
    }

    /// Run one read-modify-write cycle, retrying on lost compare-and-swap
    pub(crate) fn modify<T, F>(&self, id: &TicketId, mut apply: F) -> Result<(Ticket, T)>
    where
        F: FnMut(&mut Ticket, DateTime<Utc>) -> Result<Outcome<T>>,
    {
        let attempts = self.options.max_conflict_retries.saturating_add(1);
        for attempt in 1..=attempts {
            let mut ticket = self.repo.load(id)?;
            let expected = ticket.version;

            match apply(&mut ticket, Utc::now())? {
                Outcome::Unchanged(value) => return Ok((ticket, value)),
                Outcome::Changed(value) => {
                    ticket.version = expected + 1;
                    match self.repo.replace(&ticket, expected) {
                        Ok(()) => return Ok((ticket, value)),
                        Err(TicketDeskError::VersionMismatch { found, .. }) => {
                            tracing::warn!(
                                "Ticket {} moved to version {found} during write (attempt {attempt}/{attempts})",
                                id.short()
                            );
                            std::thread::yield_now();
                        },
                        Err(e) => return Err(e),
                    }
                },
            }
        }

        Err(TicketDeskError::Conflict {
            id: id.to_string(),
            attempts,
        })
    }

    /// Create a ticket authored by `actor`
    pub fn create(&self, input: NewTicket, actor: &Actor) -> Result<Ticket> {
        self.throttle(actor)?;
        let input = validate_new_ticket(input)?;
        let now = Utc::now();

        let ticket = Ticket {
            id: TicketId::new(),
            title: input.title,
            description: input.description,
            status: Status::Pending,
            priority: input.priority,
            author: actor.id.clone(),
            assigned_to: None,
            tags: input.tags,
            estimated_time: input.estimated_time,
            actual_time: None,
            due_date: input.due_date,
            resolved_at: None,
            closed_at: None,
            created_at: now,
            updated_at: now,
            comments: Vec::new(),
            history: vec![HistoryEntry::created(actor.id.clone(), now)],
            version: 0,
        };

        self.repo.insert(&ticket)?;
        tracing::info!("Ticket {} created by {}", ticket.id.short(), actor.id);
        Ok(ticket)
    }

    /// Fetch a ticket the actor is allowed to see
    pub fn get(&self, id: &TicketId, actor: &Actor) -> Result<Ticket> {
        let ticket = self.repo.load(id)?;
        if !policy::can_view(actor, &ticket) {
            return Err(TicketDeskError::forbidden("view this ticket"));
        }
        Ok(ticket)
    }

    /// Filtered, sorted, paginated listing
    ///
    /// Non-admins only ever see tickets they could `get`.
    pub fn list(&self, query: &TicketQuery, pagination: Pagination, actor: &Actor) -> Result<Page<Ticket>> {
        let (page, limit) =
            pagination.resolve(self.options.default_page_size, self.options.max_page_size)?;
        let now = Utc::now();

        let mut tickets: Vec<Ticket> = self
            .repo
            .load_all()?
            .into_iter()
            .filter(|t| policy::can_view(actor, t) && query.matches(t, now))
            .collect();
        query.sort(&mut tickets);

        tracing::debug!("Listing {} matching ticket(s) for {}", tickets.len(), actor.id);
        Ok(Page::slice(tickets, page, limit))
    }

    /// Apply a patch, recording one history entry per changed field
    ///
    /// Non-admin patches silently lose their `assigned_to` update. A patch
    /// that changes nothing is not persisted and leaves `updated_at` alone.
    pub fn update(&self, id: &TicketId, patch: TicketPatch, actor: &Actor) -> Result<Ticket> {
        self.throttle(actor)?;
        if policy::can_reassign(actor) {
            let assignee = patch.iter().find_map(|update| match update {
                FieldUpdate::AssignedTo(Some(user)) => Some(user),
                _ => None,
            });
            if let Some(assignee) = assignee {
                self.ensure_user_exists(assignee)?;
            }
        }

        let (ticket, changed) = self.modify(id, |ticket, now| {
            if !policy::can_modify(actor, ticket) {
                return Err(TicketDeskError::forbidden("modify this ticket"));
            }

            let mut patch = patch.clone();
            if !policy::can_reassign(actor) && patch.remove(TrackedField::AssignedTo).is_some() {
                tracing::debug!("Dropping assigned_to from patch by non-admin {}", actor.id);
            }
            let patch = validate_patch(patch)?;

            let appended = audit::apply_patch(ticket, patch, &actor.id, now);
            Ok(if appended == 0 {
                Outcome::Unchanged(0)
            } else {
                Outcome::Changed(appended)
            })
        })?;

        if changed > 0 {
            tracing::info!(
                "Ticket {} updated by {} ({changed} field(s))",
                id.short(),
                actor.id
            );
        } else {
            tracing::debug!("Ticket {} update by {} was a no-op", id.short(), actor.id);
        }
        Ok(ticket)
    }

    /// Permanently remove a ticket
    pub fn delete(&self, id: &TicketId, actor: &Actor) -> Result<DeletedTicket> {
        self.throttle(actor)?;
        let ticket = self.repo.load(id)?;
        if !policy::can_modify(actor, &ticket) {
            return Err(TicketDeskError::forbidden("delete this ticket"));
        }

        let removed = self.repo.delete(id)?;
        tracing::info!("Ticket {} deleted by {}", id.short(), actor.id);
        Ok(DeletedTicket {
            id: removed.id,
            title: removed.title,
        })
    }

    /// Assign the ticket; always records an entry, even for the same assignee
    pub fn assign(&self, id: &TicketId, assignee: &UserId, actor: &Actor) -> Result<Ticket> {
        self.throttle(actor)?;
        if !policy::can_reassign(actor) {
            return Err(TicketDeskError::forbidden("assign tickets"));
        }
        self.ensure_user_exists(assignee)?;

        let (ticket, ()) = self.modify(id, |ticket, now| {
            audit::record_assignment(ticket, assignee.clone(), &actor.id, now);
            Ok(Outcome::Changed(()))
        })?;
        tracing::info!("Ticket {} assigned to {assignee} by {}", id.short(), actor.id);
        Ok(ticket)
    }

    /// Clear the assignee and record an `unassigned` entry
    pub fn unassign(&self, id: &TicketId, actor: &Actor) -> Result<Ticket> {
        self.throttle(actor)?;
        if !policy::can_reassign(actor) {
            return Err(TicketDeskError::forbidden("unassign tickets"));
        }

        let (ticket, ()) = self.modify(id, |ticket, now| {
            audit::record_unassignment(ticket, &actor.id, now);
            Ok(Outcome::Changed(()))
        })?;
        tracing::info!("Ticket {} unassigned by {}", id.short(), actor.id);
        Ok(ticket)
    }

    fn ensure_user_exists(&self, id: &UserId) -> Result<()> {
        match self.identity.resolve(id)? {
            Some(_) => Ok(()),
            None => Err(TicketDeskError::UserNotFound { id: id.to_string() }),
        }
    }

    /// History entries, newest first
    pub fn history(&self, id: &TicketId, actor: &Actor) -> Result<Vec<HistoryEntry>> {
        let ticket = self.get(id, actor)?;
        Ok(ticket.history.into_iter().rev().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{FieldValue, HistoryAction, Priority};
    use crate::test_utils::{TestDesk, sample_ticket};

    #[test]
    fn test_create_sets_derived_fields() {
        let desk = TestDesk::new();
        let before = Utc::now();
        let ticket = desk
            .store
            .create(
                NewTicket::new("  Login broken ", "Cannot log in since update", Priority::High)
                    .with_tags(["Auth", "login", "AUTH"]),
                &desk.alice,
            )
            .unwrap();

        assert_eq!(ticket.title, "Login broken");
        assert_eq!(ticket.status, Status::Pending);
        assert_eq!(ticket.author, desk.alice.id);
        assert_eq!(ticket.tags, vec!["auth", "login"]);
        assert!(ticket.created_at >= before);
        assert_eq!(ticket.created_at, ticket.updated_at);
        assert_eq!(ticket.history.len(), 1);
        assert_eq!(ticket.history[0].action, HistoryAction::Created);
        assert_eq!(ticket.history[0].user, desk.alice.id);
    }

    #[test]
    fn test_create_then_get_round_trip() {
        let desk = TestDesk::new();
        let created = desk.store.create(sample_ticket("Printer on fire"), &desk.alice).unwrap();
        let fetched = desk.store.get(&created.id, &desk.alice).unwrap();
        assert_eq!(created, fetched);
    }

    #[test]
    fn test_invalid_create_persists_nothing() {
        let desk = TestDesk::new();
        let err = desk
            .store
            .create(NewTicket::new("abcd", "too short", Priority::Low), &desk.alice)
            .unwrap_err();
        assert_eq!(err.field_errors().len(), 2);
        assert!(desk.store.repository().load_all().unwrap().is_empty());
    }

    #[test]
    fn test_get_forbidden_for_strangers() {
        let desk = TestDesk::new();
        let ticket = desk.create_ticket("Shared drive offline", &desk.alice);
        let err = desk.store.get(&ticket.id, &desk.victor).unwrap_err();
        assert_eq!(err.kind(), "forbidden");

        let err = desk.store.get(&TicketId::new(), &desk.admin).unwrap_err();
        assert_eq!(err.kind(), "not_found");
    }

    #[test]
    fn test_list_scopes_to_visible_tickets() {
        let desk = TestDesk::new();
        let mine = desk.create_ticket("Alice's laptop", &desk.alice);
        desk.create_ticket("Bob's monitor", &desk.bob);
        let assigned = desk.create_ticket("Bob's keyboard", &desk.bob);
        desk.store.assign(&assigned.id, &desk.alice.id, &desk.admin).unwrap();

        let page = desk
            .store
            .list(&TicketQuery::new(), Pagination::default(), &desk.alice)
            .unwrap();
        assert_eq!(page.total, 2);
        assert!(page.items.iter().any(|t| t.id == mine.id));
        assert!(page.items.iter().any(|t| t.id == assigned.id));

        let all = desk
            .store
            .list(&TicketQuery::new(), Pagination::default(), &desk.admin)
            .unwrap();
        assert_eq!(all.total, 3);
        assert!(all.items.windows(2).all(|w| w[0].created_at >= w[1].created_at));

        let searched = desk
            .store
            .list(
                &TicketQuery::new().search(TextSearch::terms("MONITOR")),
                Pagination::default(),
                &desk.admin,
            )
            .unwrap();
        assert_eq!(searched.total, 1);
    }

    #[test]
    fn test_list_pagination() {
        let desk = TestDesk::new();
        for i in 0..5 {
            desk.create_ticket(&format!("Ticket number {i}"), &desk.alice);
        }

        let page = desk
            .store
            .list(&TicketQuery::new(), Pagination::new(2, 2), &desk.alice)
            .unwrap();
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.total, 5);
        assert_eq!(page.page_count, 3);

        let err = desk
            .store
            .list(&TicketQuery::new(), Pagination::new(0, 2), &desk.alice)
            .unwrap_err();
        assert_eq!(err.kind(), "validation");
    }

    #[test]
    fn test_no_op_update_keeps_updated_at() {
        let desk = TestDesk::new();
        let ticket = desk.create_ticket("Login broken", &desk.alice);

        let updated = desk
            .store
            .update(
                &ticket.id,
                TicketPatch::new().status(Status::Pending).priority(ticket.priority),
                &desk.alice,
            )
            .unwrap();
        assert_eq!(updated.history.len(), 1);
        assert_eq!(updated.updated_at, ticket.updated_at);
        assert_eq!(updated.version, ticket.version);
    }

    #[test]
    fn test_update_records_each_changed_field() {
        let desk = TestDesk::new();
        let ticket = desk.create_ticket("Login broken", &desk.alice);

        let updated = desk
            .store
            .update(
                &ticket.id,
                TicketPatch::new()
                    .priority(Priority::Critical)
                    .title("Login broken for everyone")
                    .actual_time(Some(1.5)),
                &desk.alice,
            )
            .unwrap();

        let actions: Vec<_> = updated.history.iter().map(|h| h.action).collect();
        assert_eq!(
            actions,
            vec![
                HistoryAction::Created,
                HistoryAction::PriorityChanged,
                HistoryAction::Updated,
                HistoryAction::Updated,
            ]
        );
        assert_eq!(updated.author, ticket.author);
        assert_eq!(updated.version, ticket.version + 1);
        assert!(updated.updated_at >= ticket.updated_at);
    }

    #[test]
    fn test_non_admin_assignment_is_dropped() {
        let desk = TestDesk::new();
        let ticket = desk.create_ticket("Login broken", &desk.alice);

        let updated = desk
            .store
            .update(
                &ticket.id,
                TicketPatch::new().assigned_to(Some(desk.bob.id.clone())),
                &desk.alice,
            )
            .unwrap();
        assert!(updated.assigned_to.is_none());
        assert_eq!(updated.history.len(), 1);

        let updated = desk
            .store
            .update(
                &ticket.id,
                TicketPatch::new().assigned_to(Some(desk.bob.id.clone())),
                &desk.admin,
            )
            .unwrap();
        assert_eq!(updated.assigned_to, Some(desk.bob.id.clone()));
        assert_eq!(updated.history.last().unwrap().action, HistoryAction::Assigned);
    }

    #[test]
    fn test_update_rejects_unknown_assignee() {
        let desk = TestDesk::new();
        let ticket = desk.create_ticket("Login broken", &desk.alice);

        let err = desk
            .store
            .update(
                &ticket.id,
                TicketPatch::new()
                    .status(Status::InProgress)
                    .assigned_to(Some(UserId::from("ghost"))),
                &desk.admin,
            )
            .unwrap_err();
        assert_eq!(err.kind(), "not_found");
        assert!(matches!(err, TicketDeskError::UserNotFound { .. }));

        let stored = desk.store.get(&ticket.id, &desk.admin).unwrap();
        assert!(stored.assigned_to.is_none());
        assert_eq!(stored.status, Status::Pending);
        assert_eq!(stored.history.len(), 1);

        // clearing the assignee needs no lookup
        let cleared = desk
            .store
            .update(&ticket.id, TicketPatch::new().assigned_to(None), &desk.admin)
            .unwrap();
        assert!(cleared.assigned_to.is_none());
    }

    #[test]
    fn test_update_permission_checked_before_validation() {
        let desk = TestDesk::new();
        let ticket = desk.create_ticket("Login broken", &desk.alice);

        let err = desk
            .store
            .update(&ticket.id, TicketPatch::new().title("bad"), &desk.bob)
            .unwrap_err();
        assert_eq!(err.kind(), "forbidden");

        let err = desk
            .store
            .update(&ticket.id, TicketPatch::new().title("bad").status(Status::Closed), &desk.alice)
            .unwrap_err();
        assert_eq!(err.kind(), "validation");

        let stored = desk.store.get(&ticket.id, &desk.alice).unwrap();
        assert_eq!(stored, ticket, "failed update must not write anything");
    }

    #[test]
    fn test_delete_rules() {
        let desk = TestDesk::new();
        let ticket = desk.create_ticket("Login broken", &desk.alice);

        assert_eq!(
            desk.store.delete(&ticket.id, &desk.victor).unwrap_err().kind(),
            "forbidden"
        );
        let deleted = desk.store.delete(&ticket.id, &desk.alice).unwrap();
        assert_eq!(deleted.id, ticket.id);
        assert_eq!(deleted.title, "Login broken");
        assert_eq!(
            desk.store.delete(&ticket.id, &desk.admin).unwrap_err().kind(),
            "not_found"
        );
    }

    #[test]
    fn test_assign_is_admin_only_and_always_records() {
        let desk = TestDesk::new();
        let ticket = desk.create_ticket("Login broken", &desk.alice);

        let err = desk.store.assign(&ticket.id, &desk.bob.id, &desk.alice).unwrap_err();
        assert_eq!(err.kind(), "forbidden");

        let err = desk
            .store
            .assign(&ticket.id, &UserId::from("ghost"), &desk.admin)
            .unwrap_err();
        assert!(matches!(err, TicketDeskError::UserNotFound { .. }));

        desk.store.assign(&ticket.id, &desk.bob.id, &desk.admin).unwrap();
        let again = desk.store.assign(&ticket.id, &desk.bob.id, &desk.admin).unwrap();
        let assigned: Vec<_> = again
            .history
            .iter()
            .filter(|h| h.action == HistoryAction::Assigned)
            .collect();
        assert_eq!(assigned.len(), 2);
        assert_eq!(
            assigned[1].old_value,
            Some(FieldValue::User(desk.bob.id.clone()))
        );

        // the assignee can now see the ticket but still cannot modify it
        assert!(desk.store.get(&ticket.id, &desk.bob).is_ok());
        assert_eq!(
            desk.store
                .update(&ticket.id, TicketPatch::new().status(Status::Closed), &desk.bob)
                .unwrap_err()
                .kind(),
            "forbidden"
        );
    }

    #[test]
    fn test_unassign() {
        let desk = TestDesk::new();
        let ticket = desk.create_ticket("Login broken", &desk.alice);
        desk.store.assign(&ticket.id, &desk.bob.id, &desk.admin).unwrap();

        assert_eq!(
            desk.store.unassign(&ticket.id, &desk.alice).unwrap_err().kind(),
            "forbidden"
        );
        let ticket = desk.store.unassign(&ticket.id, &desk.admin).unwrap();
        assert!(ticket.assigned_to.is_none());
        let last = ticket.history.last().unwrap();
        assert_eq!(last.action, HistoryAction::Unassigned);
        assert_eq!(last.old_value, Some(FieldValue::User(desk.bob.id.clone())));
    }

    #[test]
    fn test_history_is_newest_first() {
        let desk = TestDesk::new();
        let ticket = desk.create_ticket("Login broken", &desk.alice);
        desk.store
            .update(&ticket.id, TicketPatch::new().status(Status::InProgress), &desk.admin)
            .unwrap();

        let history = desk.store.history(&ticket.id, &desk.alice).unwrap();
        assert_eq!(history[0].action, HistoryAction::StatusChanged);
        assert_eq!(history[1].action, HistoryAction::Created);
        assert_eq!(
            desk.store.history(&ticket.id, &desk.victor).unwrap_err().kind(),
            "forbidden"
        );
    }

    #[test]
    fn test_rate_limiter_rejects_excess_writes() {
        let desk = TestDesk::new();
        let store = TicketStore::new(
            crate::storage::MemoryStorage::new(),
            desk.directory.clone(),
        )
        .with_rate_limiter(RateLimiter::new(crate::rate_limit::RateLimitPolicy::per_minute(2)));

        store.create(sample_ticket("First ticket"), &desk.alice).unwrap();
        store.create(sample_ticket("Second ticket"), &desk.alice).unwrap();
        let err = store.create(sample_ticket("Third ticket"), &desk.alice).unwrap_err();
        assert_eq!(err.kind(), "rate_limited");
        assert!(store.create(sample_ticket("Bob's ticket"), &desk.bob).is_ok());
    }

    #[test]
    fn test_conflict_after_exhausting_retries() {
        use crate::storage::MockRepository;

        let ticket = crate::core::builders::TicketBuilder::new().author("alice").build();
        let stored = ticket.clone();
        let mut repo = MockRepository::new();
        repo.expect_load().returning(move |_| Ok(stored.clone()));
        repo.expect_replace()
            .times(3)
            .returning(|t, expected| {
                Err(TicketDeskError::VersionMismatch {
                    id: t.id.to_string(),
                    expected,
                    found: expected + 1,
                })
            });

        let desk = TestDesk::new();
        let store = TicketStore::new(repo, desk.directory.clone()).with_options(StoreOptions {
            max_conflict_retries: 2,
            ..StoreOptions::default()
        });
        let err = store
            .update(&ticket.id, TicketPatch::new().status(Status::Closed), &desk.alice)
            .unwrap_err();
        assert!(matches!(err, TicketDeskError::Conflict { attempts: 3, .. }));
    }
}
