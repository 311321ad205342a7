use super::{Priority, Status, TrackedField, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A new value for exactly one tracked field
///
/// `None` inside the optional variants clears the field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "field", content = "value", rename_all = "snake_case")]
pub enum FieldUpdate {
    Title(String),
    Description(String),
    Status(Status),
    Priority(Priority),
    AssignedTo(Option<UserId>),
    Tags(Vec<String>),
    EstimatedTime(Option<f64>),
    ActualTime(Option<f64>),
    DueDate(Option<DateTime<Utc>>),
}

impl FieldUpdate {
    pub const fn field(&self) -> TrackedField {
        match self {
            Self::Title(_) => TrackedField::Title,
            Self::Description(_) => TrackedField::Description,
            Self::Status(_) => TrackedField::Status,
            Self::Priority(_) => TrackedField::Priority,
            Self::AssignedTo(_) => TrackedField::AssignedTo,
            Self::Tags(_) => TrackedField::Tags,
            Self::EstimatedTime(_) => TrackedField::EstimatedTime,
            Self::ActualTime(_) => TrackedField::ActualTime,
            Self::DueDate(_) => TrackedField::DueDate,
        }
    }
}

/// An ordered set of field updates, at most one per field
///
/// Updates keep the order in which fields were first set; setting a field
/// again replaces its value in place.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<FieldUpdate>", into = "Vec<FieldUpdate>")]
pub struct TicketPatch {
    updates: Vec<FieldUpdate>,
}

impl TicketPatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace the update for this field
    pub fn set(&mut self, update: FieldUpdate) {
        let field = update.field();
        match self.updates.iter_mut().find(|u| u.field() == field) {
            Some(existing) => *existing = update,
            None => self.updates.push(update),
        }
    }

    #[must_use]
    pub fn with(mut self, update: FieldUpdate) -> Self {
        self.set(update);
        self
    }

    #[must_use]
    pub fn title(self, title: impl Into<String>) -> Self {
        self.with(FieldUpdate::Title(title.into()))
    }

    #[must_use]
    pub fn description(self, description: impl Into<String>) -> Self {
        self.with(FieldUpdate::Description(description.into()))
    }

    #[must_use]
    pub fn status(self, status: Status) -> Self {
        self.with(FieldUpdate::Status(status))
    }

    #[must_use]
    pub fn priority(self, priority: Priority) -> Self {
        self.with(FieldUpdate::Priority(priority))
    }

    #[must_use]
    pub fn assigned_to(self, assignee: Option<UserId>) -> Self {
        self.with(FieldUpdate::AssignedTo(assignee))
    }

    #[must_use]
    pub fn tags<I, S>(self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.with(FieldUpdate::Tags(tags.into_iter().map(Into::into).collect()))
    }

    #[must_use]
    pub fn estimated_time(self, hours: Option<f64>) -> Self {
        self.with(FieldUpdate::EstimatedTime(hours))
    }

    #[must_use]
    pub fn actual_time(self, hours: Option<f64>) -> Self {
        self.with(FieldUpdate::ActualTime(hours))
    }

    #[must_use]
    pub fn due_date(self, due: Option<DateTime<Utc>>) -> Self {
        self.with(FieldUpdate::DueDate(due))
    }

    /// Drop the update for a field, returning it if present
    pub fn remove(&mut self, field: TrackedField) -> Option<FieldUpdate> {
        let index = self.updates.iter().position(|u| u.field() == field)?;
        Some(self.updates.remove(index))
    }

    pub fn contains(&self, field: TrackedField) -> bool {
        self.updates.iter().any(|u| u.field() == field)
    }

    pub fn is_empty(&self) -> bool {
        self.updates.is_empty()
    }

    pub fn len(&self) -> usize {
        self.updates.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldUpdate> {
        self.updates.iter()
    }
}

impl IntoIterator for TicketPatch {
    type Item = FieldUpdate;
    type IntoIter = std::vec::IntoIter<FieldUpdate>;

    fn into_iter(self) -> Self::IntoIter {
        self.updates.into_iter()
    }
}

impl From<Vec<FieldUpdate>> for TicketPatch {
    fn from(updates: Vec<FieldUpdate>) -> Self {
        updates.into_iter().collect()
    }
}

impl From<TicketPatch> for Vec<FieldUpdate> {
    fn from(patch: TicketPatch) -> Self {
        patch.updates
    }
}

impl FromIterator<FieldUpdate> for TicketPatch {
    fn from_iter<T: IntoIterator<Item = FieldUpdate>>(iter: T) -> Self {
        let mut patch = Self::new();
        for update in iter {
            patch.set(update);
        }
        patch
    }
}
