//! History/audit engine
//!
//! Turns a [`TicketPatch`] into field-level changes against the ticket as it
//! was loaded, applies them, and appends exactly one [`HistoryEntry`] per
//! changed field. The functions here are stateless; serializing
//! read-modify-write cycles is the store's job.

use crate::core::validation::normalize_tags;
use crate::core::{
    FieldUpdate, FieldValue, HistoryAction, HistoryEntry, Status, Ticket, TicketPatch,
    TrackedField, UserId, describe_value,
};
use chrono::{DateTime, Utc};

/// One tracked field whose value differs between the ticket and a patch
#[derive(Debug, Clone, PartialEq)]
pub struct FieldChange {
    pub field: TrackedField,
    pub old: Option<FieldValue>,
    pub new: Option<FieldValue>,
}

impl FieldChange {
    pub fn action(&self) -> HistoryAction {
        match self.field {
            TrackedField::Status => HistoryAction::StatusChanged,
            TrackedField::Priority => HistoryAction::PriorityChanged,
            TrackedField::AssignedTo if self.new.is_some() => HistoryAction::Assigned,
            TrackedField::AssignedTo => HistoryAction::Unassigned,
            _ => HistoryAction::Updated,
        }
    }

    pub fn describe(&self) -> String {
        format!(
            "{} changed from {} to {}",
            self.field,
            describe_value(self.old.as_ref()),
            describe_value(self.new.as_ref())
        )
    }

    pub fn into_entry(self, user: UserId, now: DateTime<Utc>) -> HistoryEntry {
        HistoryEntry {
            action: self.action(),
            description: self.describe(),
            field: Some(self.field),
            old_value: self.old,
            new_value: self.new,
            user,
            timestamp: now,
        }
    }
}

/// Current value of a tracked field, in its comparable form
pub fn current_value(ticket: &Ticket, field: TrackedField) -> Option<FieldValue> {
    match field {
        TrackedField::Title => Some(FieldValue::Text(ticket.title.clone())),
        TrackedField::Description => Some(FieldValue::Text(ticket.description.clone())),
        TrackedField::Status => Some(FieldValue::Status(ticket.status)),
        TrackedField::Priority => Some(FieldValue::Priority(ticket.priority)),
        TrackedField::AssignedTo => ticket.assigned_to.clone().map(FieldValue::User),
        TrackedField::Tags => Some(FieldValue::Tags(normalize_tags(&ticket.tags))),
        TrackedField::EstimatedTime => ticket.estimated_time.map(FieldValue::Hours),
        TrackedField::ActualTime => ticket.actual_time.map(FieldValue::Hours),
        TrackedField::DueDate => ticket.due_date.map(FieldValue::Timestamp),
    }
}

/// Value a patch entry would write, in the same form as [`current_value`]
pub fn proposed_value(update: &FieldUpdate) -> Option<FieldValue> {
    match update {
        FieldUpdate::Title(title) => Some(FieldValue::Text(title.clone())),
        FieldUpdate::Description(description) => Some(FieldValue::Text(description.clone())),
        FieldUpdate::Status(status) => Some(FieldValue::Status(*status)),
        FieldUpdate::Priority(priority) => Some(FieldValue::Priority(*priority)),
        FieldUpdate::AssignedTo(assignee) => assignee.clone().map(FieldValue::User),
        FieldUpdate::Tags(tags) => Some(FieldValue::Tags(normalize_tags(tags))),
        FieldUpdate::EstimatedTime(hours) | FieldUpdate::ActualTime(hours) => {
            hours.map(FieldValue::Hours)
        },
        FieldUpdate::DueDate(due) => due.map(FieldValue::Timestamp),
    }
}

/// Field-by-field diff of a patch against a ticket, in patch order
pub fn diff(ticket: &Ticket, patch: &TicketPatch) -> Vec<FieldChange> {
    patch
        .iter()
        .filter_map(|update| {
            let field = update.field();
            let old = current_value(ticket, field);
            let new = proposed_value(update);
            (old != new).then_some(FieldChange { field, old, new })
        })
        .collect()
}

/// Write one update onto the ticket without any bookkeeping
fn write_field(ticket: &mut Ticket, update: FieldUpdate) {
    match update {
        FieldUpdate::Title(title) => ticket.title = title,
        FieldUpdate::Description(description) => ticket.description = description,
        FieldUpdate::Status(status) => ticket.status = status,
        FieldUpdate::Priority(priority) => ticket.priority = priority,
        FieldUpdate::AssignedTo(assignee) => ticket.assigned_to = assignee,
        FieldUpdate::Tags(tags) => ticket.tags = normalize_tags(&tags),
        FieldUpdate::EstimatedTime(hours) => ticket.estimated_time = hours,
        FieldUpdate::ActualTime(hours) => ticket.actual_time = hours,
        FieldUpdate::DueDate(due) => ticket.due_date = due,
    }
}

/// Stamp `resolved_at` / `closed_at` the first time the status reaches them
pub fn stamp_lifecycle(ticket: &mut Ticket, now: DateTime<Utc>) {
    match ticket.status {
        Status::Resolved if ticket.resolved_at.is_none() => ticket.resolved_at = Some(now),
        Status::Closed if ticket.closed_at.is_none() => ticket.closed_at = Some(now),
        _ => {},
    }
}

/// Apply the changed fields of a patch and append their history entries
///
/// Returns the number of entries appended. When nothing differs the ticket
/// is left untouched, including `updated_at`.
pub fn apply_patch(
    ticket: &mut Ticket,
    patch: TicketPatch,
    user: &UserId,
    now: DateTime<Utc>,
) -> usize {
    let changes = diff(ticket, &patch);
    if changes.is_empty() {
        return 0;
    }

    for update in patch {
        let field = update.field();
        if changes.iter().any(|c| c.field == field) {
            write_field(ticket, update);
        }
    }

    let count = changes.len();
    ticket.history.extend(
        changes
            .into_iter()
            .map(|change| change.into_entry(user.clone(), now)),
    );
    ticket.updated_at = now;
    stamp_lifecycle(ticket, now);
    count
}

/// Set the assignee unconditionally and record an `assigned` entry
///
/// Re-assigning to the current assignee still records an entry.
pub fn record_assignment(ticket: &mut Ticket, assignee: UserId, user: &UserId, now: DateTime<Utc>) {
    let old = ticket.assigned_to.replace(assignee.clone());
    ticket.history.push(HistoryEntry {
        action: HistoryAction::Assigned,
        field: Some(TrackedField::AssignedTo),
        old_value: old.map(FieldValue::User),
        new_value: Some(FieldValue::User(assignee.clone())),
        user: user.clone(),
        timestamp: now,
        description: format!("Ticket assigned to {assignee}"),
    });
    ticket.updated_at = now;
}

/// Clear the assignee and record an `unassigned` entry
pub fn record_unassignment(ticket: &mut Ticket, user: &UserId, now: DateTime<Utc>) {
    let old = ticket.assigned_to.take();
    ticket.history.push(HistoryEntry {
        action: HistoryAction::Unassigned,
        field: Some(TrackedField::AssignedTo),
        old_value: old.map(FieldValue::User),
        new_value: None,
        user: user.clone(),
        timestamp: now,
        description: "Ticket unassigned".to_string(),
    });
    ticket.updated_at = now;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Priority;
    use crate::core::builders::TicketBuilder;
    use chrono::Duration;

    fn ticket() -> Ticket {
        TicketBuilder::new()
            .author("alice")
            .title("Login broken")
            .tag("auth")
            .tag("login")
            .build()
    }

    #[test]
    fn test_no_op_patch_produces_nothing() {
        let mut t = ticket();
        let before = t.clone();
        let patch = TicketPatch::new()
            .status(Status::Pending)
            .title("Login broken")
            .tags(["LOGIN", "auth"])
            .assigned_to(None);

        assert!(diff(&t, &patch).is_empty());
        let appended = apply_patch(&mut t, patch, &UserId::from("root"), Utc::now());
        assert_eq!(appended, 0);
        assert_eq!(t, before);
    }

    #[test]
    fn test_actions_per_field() {
        let t = ticket();
        let patch = TicketPatch::new()
            .priority(Priority::Critical)
            .title("Login totally broken")
            .status(Status::InProgress)
            .assigned_to(Some(UserId::from("bob")));

        let changes = diff(&t, &patch);
        let actions: Vec<_> = changes.iter().map(FieldChange::action).collect();
        assert_eq!(
            actions,
            vec![
                HistoryAction::PriorityChanged,
                HistoryAction::Updated,
                HistoryAction::StatusChanged,
                HistoryAction::Assigned,
            ]
        );

        let mut assigned = t.clone();
        assigned.assigned_to = Some(UserId::from("bob"));
        let changes = diff(&assigned, &TicketPatch::new().assigned_to(None));
        assert_eq!(changes[0].action(), HistoryAction::Unassigned);
        assert_eq!(changes[0].old, Some(FieldValue::User(UserId::from("bob"))));
        assert_eq!(changes[0].new, None);
    }

    #[test]
    fn test_apply_patch_records_old_and_new() {
        let mut t = ticket();
        let now = t.created_at + Duration::minutes(5);
        let appended = apply_patch(
            &mut t,
            TicketPatch::new().status(Status::InProgress),
            &UserId::from("root"),
            now,
        );

        assert_eq!(appended, 1);
        let entry = t.history.last().unwrap();
        assert_eq!(entry.action, HistoryAction::StatusChanged);
        assert_eq!(entry.field, Some(TrackedField::Status));
        assert_eq!(entry.old_value, Some(FieldValue::Status(Status::Pending)));
        assert_eq!(entry.new_value, Some(FieldValue::Status(Status::InProgress)));
        assert_eq!(entry.user, UserId::from("root"));
        assert_eq!(entry.description, "status changed from pending to in_progress");
        assert_eq!(t.updated_at, now);
        assert!(t.resolved_at.is_none());
    }

    #[test]
    fn test_only_changed_fields_are_written() {
        let mut t = ticket();
        let appended = apply_patch(
            &mut t,
            TicketPatch::new().title("Login broken").priority(Priority::Low),
            &UserId::from("alice"),
            Utc::now(),
        );
        assert_eq!(appended, 1);
        assert_eq!(t.history[0].field, Some(TrackedField::Priority));
    }

    #[test]
    fn test_resolved_at_is_stamped_once() {
        let mut t = ticket();
        let user = UserId::from("root");
        let first = t.created_at + Duration::hours(1);
        apply_patch(&mut t, TicketPatch::new().status(Status::Resolved), &user, first);
        assert_eq!(t.resolved_at, Some(first));

        let later = first + Duration::hours(1);
        apply_patch(&mut t, TicketPatch::new().status(Status::InProgress), &user, later);
        apply_patch(&mut t, TicketPatch::new().status(Status::Resolved), &user, later);
        assert_eq!(t.resolved_at, Some(first));
        assert_eq!(t.history.len(), 3);

        apply_patch(&mut t, TicketPatch::new().status(Status::Closed), &user, later);
        assert_eq!(t.closed_at, Some(later));
        assert_eq!(t.history.len(), 4);
    }

    #[test]
    fn test_reassignment_always_records() {
        let mut t = ticket();
        let admin = UserId::from("root");
        let now = Utc::now();
        record_assignment(&mut t, UserId::from("bob"), &admin, now);
        record_assignment(&mut t, UserId::from("bob"), &admin, now);
        assert_eq!(t.history.len(), 2);
        assert_eq!(t.history[1].old_value, Some(FieldValue::User(UserId::from("bob"))));

        record_unassignment(&mut t, &admin, now);
        assert!(t.assigned_to.is_none());
        assert_eq!(t.history[2].action, HistoryAction::Unassigned);
    }
}
