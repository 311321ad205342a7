use super::{Priority, Status, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// What kind of change a history entry records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryAction {
    Created,
    Updated,
    StatusChanged,
    PriorityChanged,
    Assigned,
    Unassigned,
    Commented,
}

impl fmt::Display for HistoryAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Created => "created",
            Self::Updated => "updated",
            Self::StatusChanged => "status_changed",
            Self::PriorityChanged => "priority_changed",
            Self::Assigned => "assigned",
            Self::Unassigned => "unassigned",
            Self::Commented => "commented",
        };
        f.write_str(name)
    }
}

/// Ticket attributes whose changes are recorded in history
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackedField {
    Title,
    Description,
    Status,
    Priority,
    AssignedTo,
    Tags,
    EstimatedTime,
    ActualTime,
    DueDate,
}

impl TrackedField {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Description => "description",
            Self::Status => "status",
            Self::Priority => "priority",
            Self::AssignedTo => "assigned_to",
            Self::Tags => "tags",
            Self::EstimatedTime => "estimated_time",
            Self::ActualTime => "actual_time",
            Self::DueDate => "due_date",
        }
    }
}

impl fmt::Display for TrackedField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Before/after value captured in a history entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum FieldValue {
    Text(String),
    Status(Status),
    Priority(Priority),
    User(UserId),
    Tags(Vec<String>),
    Hours(f64),
    Timestamp(DateTime<Utc>),
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => write!(f, "\"{text}\""),
            Self::Status(status) => write!(f, "{status}"),
            Self::Priority(priority) => write!(f, "{priority}"),
            Self::User(user) => write!(f, "{user}"),
            Self::Tags(tags) => write!(f, "[{}]", tags.join(", ")),
            Self::Hours(hours) => write!(f, "{hours}h"),
            Self::Timestamp(ts) => write!(f, "{}", ts.format("%Y-%m-%d %H:%M UTC")),
        }
    }
}

/// Immutable audit record of one change to a ticket
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub action: HistoryAction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<TrackedField>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_value: Option<FieldValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_value: Option<FieldValue>,
    pub user: UserId,
    pub timestamp: DateTime<Utc>,
    pub description: String,
}

impl HistoryEntry {
    pub fn created(user: UserId, now: DateTime<Utc>) -> Self {
        Self {
            action: HistoryAction::Created,
            field: None,
            old_value: None,
            new_value: None,
            user,
            timestamp: now,
            description: "Ticket created".to_string(),
        }
    }

    pub fn commented(user: UserId, now: DateTime<Utc>) -> Self {
        Self {
            action: HistoryAction::Commented,
            field: None,
            old_value: None,
            new_value: None,
            user,
            timestamp: now,
            description: "Comment added".to_string(),
        }
    }
}

/// Render an optional value for a history description
pub(crate) fn describe_value(value: Option<&FieldValue>) -> String {
    value.map_or_else(|| "(none)".to_string(), ToString::to_string)
}
