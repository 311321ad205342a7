use super::TicketStore;
use crate::core::{Actor, Ticket};
use crate::error::{Result, TicketDeskError};
use crate::policy;
use crate::stats::{self, TicketStatistics, UserTicketStats};
use crate::storage::TicketRepository;
use chrono::Utc;

impl<R: TicketRepository> TicketStore<R> {
    /// Totals across every ticket (admin only)
    pub fn statistics(&self, actor: &Actor) -> Result<TicketStatistics> {
        if !policy::can_view_statistics(actor) {
            return Err(TicketDeskError::forbidden("view statistics"));
        }
        let tickets = self.repo.load_all()?;
        Ok(TicketStatistics::compute(
            &tickets,
            Utc::now(),
            self.options.recent_tickets_limit,
            self.options.overdue_preview_limit,
        ))
    }

    /// Overdue tickets visible to `actor`, earliest due date first
    pub fn overdue(&self, limit: Option<usize>, actor: &Actor) -> Result<Vec<Ticket>> {
        let tickets: Vec<Ticket> = self
            .repo
            .load_all()?
            .into_iter()
            .filter(|t| policy::can_view(actor, t))
            .collect();
        Ok(stats::find_overdue(&tickets, Utc::now(), limit)
            .into_iter()
            .cloned()
            .collect())
    }

    /// Per-author counts joined with directory names (admin only)
    pub fn user_stats(&self, actor: &Actor) -> Result<Vec<UserTicketStats>> {
        if !policy::can_view_statistics(actor) {
            return Err(TicketDeskError::forbidden("view statistics"));
        }
        let tickets = self.repo.load_all()?;
        let mut rows = stats::user_ticket_stats(&tickets, self.options.user_stats_limit);
        for row in &mut rows {
            if let Some(profile) = self.identity.resolve(&row.author)? {
                row.name = Some(profile.name);
                row.email = Some(profile.email);
            }
        }
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use crate::core::{Status, TicketPatch};
    use crate::test_utils::TestDesk;
    use chrono::{Duration, Utc};

    #[test]
    fn test_statistics_admin_only() {
        let desk = TestDesk::new();
        desk.create_ticket("Login broken", &desk.alice);
        assert_eq!(desk.store.statistics(&desk.alice).unwrap_err().kind(), "forbidden");
        assert_eq!(desk.store.statistics(&desk.admin).unwrap().total, 1);
    }

    #[test]
    fn test_overdue_respects_visibility() {
        let desk = TestDesk::new();
        let past = Utc::now() - Duration::days(2);
        let mine = desk.create_ticket("Alice's overdue", &desk.alice);
        let theirs = desk.create_ticket("Bob's overdue", &desk.bob);
        for (ticket, actor) in [(&mine, &desk.alice), (&theirs, &desk.bob)] {
            desk.store
                .update(&ticket.id, TicketPatch::new().due_date(Some(past)), actor)
                .unwrap();
        }

        assert_eq!(desk.store.overdue(None, &desk.alice).unwrap().len(), 1);
        assert_eq!(desk.store.overdue(None, &desk.admin).unwrap().len(), 2);

        desk.store
            .update(&mine.id, TicketPatch::new().status(Status::Resolved), &desk.alice)
            .unwrap();
        assert!(desk.store.overdue(None, &desk.alice).unwrap().is_empty());
    }

    #[test]
    fn test_user_stats_joins_names() {
        let desk = TestDesk::new();
        desk.create_ticket("First from Alice", &desk.alice);
        desk.create_ticket("Second from Alice", &desk.alice);
        desk.create_ticket("First from Bob", &desk.bob);

        let rows = desk.store.user_stats(&desk.admin).unwrap();
        assert_eq!(rows[0].author, desk.alice.id);
        assert_eq!(rows[0].name.as_deref(), Some("Alice Anders"));
        assert_eq!(rows[0].total, 2);
        assert_eq!(rows[1].open, 1);
        assert_eq!(desk.store.user_stats(&desk.bob).unwrap_err().kind(), "forbidden");
    }
}
