use super::{Comment, CommentId, HistoryEntry, Priority, Status, Ticket, TicketId, UserId};
use chrono::{DateTime, Utc};

/// Builder for creating Ticket instances directly, bypassing the store
///
/// Used for fixtures and for seeding repositories; tickets built here skip
/// validation and carry no history unless one is supplied.
#[derive(Default)]
pub struct TicketBuilder {
    id: Option<TicketId>,
    title: Option<String>,
    description: Option<String>,
    priority: Option<Priority>,
    status: Option<Status>,
    author: Option<UserId>,
    assigned_to: Option<UserId>,
    tags: Vec<String>,
    due_date: Option<DateTime<Utc>>,
    created_at: Option<DateTime<Utc>>,
    resolved_at: Option<DateTime<Utc>>,
    closed_at: Option<DateTime<Utc>>,
    comments: Vec<Comment>,
    history: Vec<HistoryEntry>,
}

impl TicketBuilder {
    /// Create a new ticket builder
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the ticket ID
    #[must_use]
    pub fn id(mut self, id: TicketId) -> Self {
        self.id = Some(id);
        self
    }

    /// Set the title
    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set the description
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set the priority
    #[must_use]
    pub const fn priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Set the status
    #[must_use]
    pub const fn status(mut self, status: Status) -> Self {
        self.status = Some(status);
        self
    }

    /// Set the author
    #[must_use]
    pub fn author(mut self, author: impl Into<UserId>) -> Self {
        self.author = Some(author.into());
        self
    }

    /// Set assignee
    #[must_use]
    pub fn assigned_to(mut self, assignee: impl Into<UserId>) -> Self {
        self.assigned_to = Some(assignee.into());
        self
    }

    /// Add a single tag
    #[must_use]
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// Set the due date
    #[must_use]
    pub const fn due_date(mut self, due: DateTime<Utc>) -> Self {
        self.due_date = Some(due);
        self
    }

    /// Set `created_at` timestamp
    #[must_use]
    pub const fn created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = Some(created_at);
        self
    }

    /// Set `resolved_at` timestamp
    #[must_use]
    pub const fn resolved_at(mut self, resolved_at: DateTime<Utc>) -> Self {
        self.resolved_at = Some(resolved_at);
        self
    }

    /// Set `closed_at` timestamp
    #[must_use]
    pub const fn closed_at(mut self, closed_at: DateTime<Utc>) -> Self {
        self.closed_at = Some(closed_at);
        self
    }

    /// Add a comment by `author`
    #[must_use]
    pub fn comment(mut self, content: impl Into<String>, author: impl Into<UserId>) -> Self {
        let now = self.created_at.unwrap_or_else(Utc::now);
        self.comments.push(Comment {
            id: CommentId::new(),
            content: content.into(),
            author: author.into(),
            created_at: now,
            updated_at: now,
            is_edited: false,
        });
        self
    }

    /// Add a history entry
    #[must_use]
    pub fn history_entry(mut self, entry: HistoryEntry) -> Self {
        self.history.push(entry);
        self
    }

    /// Build the ticket
    pub fn build(self) -> Ticket {
        let created_at = self.created_at.unwrap_or_else(Utc::now);
        Ticket {
            id: self.id.unwrap_or_default(),
            title: self.title.unwrap_or_else(|| "Untitled ticket".to_string()),
            description: self
                .description
                .unwrap_or_else(|| "No description provided".to_string()),
            status: self.status.unwrap_or_default(),
            priority: self.priority.unwrap_or_default(),
            author: self.author.unwrap_or_else(|| UserId::from("anonymous")),
            assigned_to: self.assigned_to,
            tags: self.tags,
            estimated_time: None,
            actual_time: None,
            due_date: self.due_date,
            resolved_at: self.resolved_at,
            closed_at: self.closed_at,
            created_at,
            updated_at: created_at,
            comments: self.comments,
            history: self.history,
            version: 0,
        }
    }
}
