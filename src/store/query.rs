use crate::core::validation::normalize_tags;
use crate::core::{Priority, Status, Ticket, UserId};
use crate::error::{FieldError, Result, TicketDeskError};
use chrono::{DateTime, Utc};
use regex::{Regex, RegexBuilder};
use serde::Serialize;
use std::cmp::Ordering;
use std::str::FromStr;

/// Free-text search over title and description
#[derive(Debug, Clone)]
pub enum TextSearch {
    /// Lowercased terms; a ticket matches if any term occurs
    Terms(Vec<String>),
    /// Case-insensitive regular expression
    Pattern(Regex),
}

impl TextSearch {
    pub fn terms(query: &str) -> Self {
        Self::Terms(query.split_whitespace().map(str::to_lowercase).collect())
    }

    pub fn pattern(pattern: &str) -> Result<Self> {
        RegexBuilder::new(pattern)
            .case_insensitive(true)
            .build()
            .map(Self::Pattern)
            .map_err(|e| TicketDeskError::validation("search", format!("invalid pattern: {e}")))
    }

    fn matches(&self, ticket: &Ticket) -> bool {
        match self {
            Self::Terms(terms) => {
                if terms.is_empty() {
                    return true;
                }
                let title = ticket.title.to_lowercase();
                let description = ticket.description.to_lowercase();
                terms
                    .iter()
                    .any(|term| title.contains(term.as_str()) || description.contains(term.as_str()))
            },
            Self::Pattern(regex) => regex.is_match(&ticket.title) || regex.is_match(&ticket.description),
        }
    }
}

/// Sort keys for ticket listings
///
/// Each key has a natural direction: newest first for timestamps, most
/// urgent first for priority, workflow order for status, A to Z for titles
/// and soonest first for due dates (tickets without one last).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortBy {
    #[default]
    Created,
    Updated,
    Priority,
    Status,
    Title,
    DueDate,
}

impl SortBy {
    fn compare(self, a: &Ticket, b: &Ticket) -> Ordering {
        match self {
            Self::Created => b.created_at.cmp(&a.created_at),
            Self::Updated => b.updated_at.cmp(&a.updated_at),
            Self::Priority => b.priority.cmp(&a.priority),
            Self::Status => a.status.cmp(&b.status),
            Self::Title => a.title.to_lowercase().cmp(&b.title.to_lowercase()),
            Self::DueDate => match (a.due_date, b.due_date) {
                (Some(x), Some(y)) => x.cmp(&y),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            },
        }
    }
}

impl FromStr for SortBy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "created" | "created_at" => Ok(Self::Created),
            "updated" | "updated_at" => Ok(Self::Updated),
            "priority" => Ok(Self::Priority),
            "status" => Ok(Self::Status),
            "title" => Ok(Self::Title),
            "due" | "due_date" => Ok(Self::DueDate),
            other => Err(format!(
                "Invalid sort key '{other}'. Expected one of: created, updated, priority, status, title, due"
            )),
        }
    }
}

/// Filters and ordering for [`TicketStore::list`](super::TicketStore::list)
#[derive(Debug, Clone, Default)]
pub struct TicketQuery {
    pub status: Option<Status>,
    pub priority: Option<Priority>,
    pub author: Option<UserId>,
    pub assigned_to: Option<UserId>,
    /// Every tag listed must be present
    pub tags: Vec<String>,
    pub search: Option<TextSearch>,
    pub overdue_only: bool,
    pub sort_by: SortBy,
    pub reverse: bool,
}

impl TicketQuery {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn status(mut self, status: Status) -> Self {
        self.status = Some(status);
        self
    }

    #[must_use]
    pub const fn priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    #[must_use]
    pub fn author(mut self, author: impl Into<UserId>) -> Self {
        self.author = Some(author.into());
        self
    }

    #[must_use]
    pub fn assigned_to(mut self, assignee: impl Into<UserId>) -> Self {
        self.assigned_to = Some(assignee.into());
        self
    }

    #[must_use]
    pub fn tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.tags = normalize_tags(tags);
        self
    }

    #[must_use]
    pub fn search(mut self, search: TextSearch) -> Self {
        self.search = Some(search);
        self
    }

    #[must_use]
    pub const fn overdue_only(mut self) -> Self {
        self.overdue_only = true;
        self
    }

    #[must_use]
    pub const fn sort_by(mut self, sort_by: SortBy, reverse: bool) -> Self {
        self.sort_by = sort_by;
        self.reverse = reverse;
        self
    }

    /// Check if a ticket matches all filter criteria
    pub fn matches(&self, ticket: &Ticket, now: DateTime<Utc>) -> bool {
        if self.status.is_some_and(|s| ticket.status != s) {
            return false;
        }
        if self.priority.is_some_and(|p| ticket.priority != p) {
            return false;
        }
        if self.author.as_ref().is_some_and(|a| &ticket.author != a) {
            return false;
        }
        if self
            .assigned_to
            .as_ref()
            .is_some_and(|a| !ticket.is_assigned_to(a))
        {
            return false;
        }
        if !self.tags.iter().all(|tag| ticket.tags.contains(tag)) {
            return false;
        }
        if self.overdue_only && !ticket.is_overdue(now) {
            return false;
        }
        self.search.as_ref().is_none_or(|s| s.matches(ticket))
    }

    /// Sort tickets by the configured key; ties fall back to id for a
    /// stable page order
    pub fn sort(&self, tickets: &mut [Ticket]) {
        tickets.sort_by(|a, b| {
            let ordering = self.sort_by.compare(a, b).then_with(|| a.id.cmp(&b.id));
            if self.reverse {
                ordering.reverse()
            } else {
                ordering
            }
        });
    }
}

/// Requested page; `limit` falls back to the store's default page size
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: usize,
    pub limit: Option<usize>,
}

impl Default for Pagination {
    fn default() -> Self {
        Self { page: 1, limit: None }
    }
}

impl Pagination {
    pub const fn new(page: usize, limit: usize) -> Self {
        Self {
            page,
            limit: Some(limit),
        }
    }

    /// Validate and resolve to `(page, limit)`, capping the limit
    pub(crate) fn resolve(self, default_limit: usize, max_limit: usize) -> Result<(usize, usize)> {
        let mut errors = Vec::new();
        if self.page == 0 {
            errors.push(FieldError::new("page", "must be at least 1"));
        }
        if self.limit == Some(0) {
            errors.push(FieldError::new("limit", "must be greater than 0"));
        }
        if !errors.is_empty() {
            return Err(TicketDeskError::Validation { errors });
        }
        let limit = self.limit.unwrap_or(default_limit).min(max_limit).max(1);
        Ok((self.page, limit))
    }
}

/// One page of results
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: usize,
    pub page: usize,
    pub limit: usize,
    pub page_count: usize,
}

impl<T> Page<T> {
    pub(crate) fn slice(all: Vec<T>, page: usize, limit: usize) -> Self {
        let total = all.len();
        let page_count = total.div_ceil(limit);
        let items = all
            .into_iter()
            .skip((page - 1).saturating_mul(limit))
            .take(limit)
            .collect();
        Self {
            items,
            total,
            page,
            limit,
            page_count,
        }
    }
}
