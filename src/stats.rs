//! Statistics aggregation
//!
//! Everything here is computed on demand from a ticket snapshot in a single
//! pass; nothing is cached between calls.

use crate::core::{Priority, Status, Ticket, TicketId, UserId};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;

/// Ticket counts per status, zero-filled
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub pending: usize,
    pub in_progress: usize,
    pub resolved: usize,
    pub closed: usize,
}

impl StatusCounts {
    fn record(&mut self, status: Status) {
        match status {
            Status::Pending => self.pending += 1,
            Status::InProgress => self.in_progress += 1,
            Status::Resolved => self.resolved += 1,
            Status::Closed => self.closed += 1,
        }
    }

    pub const fn get(&self, status: Status) -> usize {
        match status {
            Status::Pending => self.pending,
            Status::InProgress => self.in_progress,
            Status::Resolved => self.resolved,
            Status::Closed => self.closed,
        }
    }
}

/// Ticket counts per priority, zero-filled
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PriorityCounts {
    pub low: usize,
    pub medium: usize,
    pub high: usize,
    pub critical: usize,
}

impl PriorityCounts {
    fn record(&mut self, priority: Priority) {
        match priority {
            Priority::Low => self.low += 1,
            Priority::Medium => self.medium += 1,
            Priority::High => self.high += 1,
            Priority::Critical => self.critical += 1,
        }
    }

    pub const fn get(&self, priority: Priority) -> usize {
        match priority {
            Priority::Low => self.low,
            Priority::Medium => self.medium,
            Priority::High => self.high,
            Priority::Critical => self.critical,
        }
    }
}

/// Compact ticket line used in report previews
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TicketSummary {
    pub id: TicketId,
    pub title: String,
    pub status: Status,
    pub priority: Priority,
    pub author: UserId,
    pub assigned_to: Option<UserId>,
    pub created_at: DateTime<Utc>,
    pub due_date: Option<DateTime<Utc>>,
}

impl From<&Ticket> for TicketSummary {
    fn from(ticket: &Ticket) -> Self {
        Self {
            id: ticket.id.clone(),
            title: ticket.title.clone(),
            status: ticket.status,
            priority: ticket.priority,
            author: ticket.author.clone(),
            assigned_to: ticket.assigned_to.clone(),
            created_at: ticket.created_at,
            due_date: ticket.due_date,
        }
    }
}

/// Dashboard totals
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TicketStatistics {
    pub total: usize,
    pub by_status: StatusCounts,
    pub by_priority: PriorityCounts,
    pub overdue_count: usize,
    pub recent_tickets: Vec<TicketSummary>,
    pub overdue_tickets: Vec<TicketSummary>,
}

impl TicketStatistics {
    /// Aggregate a snapshot; `recent_limit` and `overdue_limit` bound the
    /// preview lists, not the counts
    pub fn compute(tickets: &[Ticket], now: DateTime<Utc>, recent_limit: usize, overdue_limit: usize) -> Self {
        let mut by_status = StatusCounts::default();
        let mut by_priority = PriorityCounts::default();
        for ticket in tickets {
            by_status.record(ticket.status);
            by_priority.record(ticket.priority);
        }

        let mut recent: Vec<&Ticket> = tickets.iter().collect();
        recent.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));

        let overdue = find_overdue(tickets, now, None);

        Self {
            total: tickets.len(),
            by_status,
            by_priority,
            overdue_count: overdue.len(),
            recent_tickets: recent.into_iter().take(recent_limit).map(TicketSummary::from).collect(),
            overdue_tickets: overdue.into_iter().take(overdue_limit).map(TicketSummary::from).collect(),
        }
    }
}

/// Past due and still open (pending or in progress)
pub fn is_past_due(ticket: &Ticket, now: DateTime<Utc>) -> bool {
    ticket.status.is_open() && ticket.due_date.is_some_and(|due| due < now)
}

/// Open tickets past their due date, earliest due date first
pub fn find_overdue(tickets: &[Ticket], now: DateTime<Utc>, limit: Option<usize>) -> Vec<&Ticket> {
    let mut overdue: Vec<&Ticket> = tickets.iter().filter(|t| is_past_due(t, now)).collect();
    overdue.sort_by(|a, b| a.due_date.cmp(&b.due_date).then_with(|| a.id.cmp(&b.id)));
    if let Some(limit) = limit {
        overdue.truncate(limit);
    }
    overdue
}

/// Per-author ticket counts
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserTicketStats {
    pub author: UserId,
    /// Display fields, absent when the author is unknown to the directory
    pub name: Option<String>,
    pub email: Option<String>,
    pub total: usize,
    /// Pending plus in progress
    pub open: usize,
    /// Resolved plus closed
    pub resolved: usize,
}

/// Count tickets per author, busiest first (ties by author id)
pub fn user_ticket_stats(tickets: &[Ticket], limit: usize) -> Vec<UserTicketStats> {
    let mut per_author: HashMap<&UserId, (usize, usize, usize)> = HashMap::new();
    for ticket in tickets {
        let entry = per_author.entry(&ticket.author).or_default();
        entry.0 += 1;
        if ticket.status.is_open() {
            entry.1 += 1;
        } else {
            entry.2 += 1;
        }
    }

    let mut stats: Vec<UserTicketStats> = per_author
        .into_iter()
        .map(|(author, (total, open, resolved))| UserTicketStats {
            author: author.clone(),
            name: None,
            email: None,
            total,
            open,
            resolved,
        })
        .collect();
    stats.sort_by(|a, b| b.total.cmp(&a.total).then_with(|| a.author.cmp(&b.author)));
    stats.truncate(limit);
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::builders::TicketBuilder;
    use chrono::Duration;

    fn ticket(author: &str, status: Status) -> Ticket {
        TicketBuilder::new().author(author).status(status).build()
    }

    #[test]
    fn test_counts_are_zero_filled() {
        let tickets = vec![
            ticket("alice", Status::Pending),
            ticket("alice", Status::Pending),
            ticket("bob", Status::Pending),
            ticket("bob", Status::Resolved),
            ticket("carol", Status::Resolved),
        ];
        let stats = TicketStatistics::compute(&tickets, Utc::now(), 5, 5);

        assert_eq!(stats.total, 5);
        assert_eq!(
            stats.by_status,
            StatusCounts {
                pending: 3,
                in_progress: 0,
                resolved: 2,
                closed: 0,
            }
        );
        assert_eq!(stats.by_priority.get(Priority::Medium), 5);
        assert_eq!(stats.by_priority.get(Priority::Critical), 0);
        assert_eq!(stats.recent_tickets.len(), 5);
        assert_eq!(stats.overdue_count, 0);
    }

    #[test]
    fn test_empty_snapshot() {
        let stats = TicketStatistics::compute(&[], Utc::now(), 5, 5);
        assert_eq!(stats.total, 0);
        assert_eq!(stats.by_status, StatusCounts::default());
        assert!(stats.recent_tickets.is_empty());
    }

    #[test]
    fn test_overdue_excludes_finished_and_sorts_by_due() {
        let now = Utc::now();
        let later = TicketBuilder::new().due_date(now - Duration::hours(1)).build();
        let earlier = TicketBuilder::new()
            .status(Status::InProgress)
            .due_date(now - Duration::days(3))
            .build();
        let resolved = TicketBuilder::new()
            .status(Status::Resolved)
            .due_date(now - Duration::days(5))
            .build();
        let future = TicketBuilder::new().due_date(now + Duration::days(1)).build();
        let tickets = vec![later.clone(), earlier.clone(), resolved, future];

        let overdue = find_overdue(&tickets, now, None);
        let ids: Vec<_> = overdue.iter().map(|t| t.id.clone()).collect();
        assert_eq!(ids, vec![earlier.id.clone(), later.id]);

        assert_eq!(find_overdue(&tickets, now, Some(1)).len(), 1);

        let stats = TicketStatistics::compute(&tickets, now, 5, 1);
        assert_eq!(stats.overdue_count, 2);
        assert_eq!(stats.overdue_tickets.len(), 1);
        assert_eq!(stats.overdue_tickets[0].id, earlier.id);
    }

    #[test]
    fn test_user_stats_ordering_and_buckets() {
        let tickets = vec![
            ticket("bob", Status::Pending),
            ticket("bob", Status::Closed),
            ticket("alice", Status::InProgress),
            ticket("alice", Status::Resolved),
            ticket("carol", Status::Pending),
        ];

        let stats = user_ticket_stats(&tickets, 10);
        let authors: Vec<_> = stats.iter().map(|s| s.author.as_str()).collect();
        assert_eq!(authors, vec!["alice", "bob", "carol"]);
        assert_eq!((stats[0].total, stats[0].open, stats[0].resolved), (2, 1, 1));

        assert_eq!(user_ticket_stats(&tickets, 1).len(), 1);
    }
}
