//! Field constraints shared by ticket creation, updates and comments
//!
//! Validators take ownership of the input, normalize it (trimming text,
//! canonicalizing tags) and either return the normalized value or a
//! [`TicketDeskError::Validation`] listing every violated field.

use super::{FieldUpdate, NewTicket, TicketPatch};
use crate::error::{FieldError, Result, TicketDeskError};

pub const TITLE_MIN: usize = 5;
pub const TITLE_MAX: usize = 200;
pub const DESCRIPTION_MIN: usize = 10;
pub const DESCRIPTION_MAX: usize = 2000;
pub const COMMENT_MIN: usize = 3;
pub const COMMENT_MAX: usize = 1000;

fn check_length(field: &str, value: &str, min: usize, max: usize, errors: &mut Vec<FieldError>) {
    let len = value.chars().count();
    if len < min {
        errors.push(FieldError::new(
            field,
            format!("must be at least {min} characters (got {len})"),
        ));
    } else if len > max {
        errors.push(FieldError::new(
            field,
            format!("must be at most {max} characters (got {len})"),
        ));
    }
}

fn check_hours(field: &str, hours: Option<f64>, errors: &mut Vec<FieldError>) {
    if let Some(hours) = hours {
        if !hours.is_finite() || hours < 0.0 {
            errors.push(FieldError::new(field, "must be a non-negative number of hours"));
        }
    }
}

fn finish<T>(value: T, errors: Vec<FieldError>) -> Result<T> {
    if errors.is_empty() {
        Ok(value)
    } else {
        Err(TicketDeskError::Validation { errors })
    }
}

/// Lowercase, trim, drop empties, deduplicate and sort
pub fn normalize_tags<I, S>(tags: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut normalized: Vec<String> = tags
        .into_iter()
        .map(|t| t.as_ref().trim().to_lowercase())
        .filter(|t| !t.is_empty())
        .collect();
    normalized.sort();
    normalized.dedup();
    normalized
}

/// Validate and normalize the input for a new ticket
pub fn validate_new_ticket(input: NewTicket) -> Result<NewTicket> {
    let mut errors = Vec::new();

    let title = input.title.trim().to_string();
    let description = input.description.trim().to_string();
    check_length("title", &title, TITLE_MIN, TITLE_MAX, &mut errors);
    check_length(
        "description",
        &description,
        DESCRIPTION_MIN,
        DESCRIPTION_MAX,
        &mut errors,
    );
    check_hours("estimated_time", input.estimated_time, &mut errors);

    finish(
        NewTicket {
            title,
            description,
            priority: input.priority,
            tags: normalize_tags(&input.tags),
            estimated_time: input.estimated_time,
            due_date: input.due_date,
        },
        errors,
    )
}

/// Validate and normalize the fields present in a patch
pub fn validate_patch(patch: TicketPatch) -> Result<TicketPatch> {
    let mut errors = Vec::new();

    let normalized = patch
        .into_iter()
        .map(|update| match update {
            FieldUpdate::Title(title) => {
                let title = title.trim().to_string();
                check_length("title", &title, TITLE_MIN, TITLE_MAX, &mut errors);
                FieldUpdate::Title(title)
            },
            FieldUpdate::Description(description) => {
                let description = description.trim().to_string();
                check_length(
                    "description",
                    &description,
                    DESCRIPTION_MIN,
                    DESCRIPTION_MAX,
                    &mut errors,
                );
                FieldUpdate::Description(description)
            },
            FieldUpdate::Tags(tags) => FieldUpdate::Tags(normalize_tags(&tags)),
            FieldUpdate::EstimatedTime(hours) => {
                check_hours("estimated_time", hours, &mut errors);
                FieldUpdate::EstimatedTime(hours)
            },
            FieldUpdate::ActualTime(hours) => {
                check_hours("actual_time", hours, &mut errors);
                FieldUpdate::ActualTime(hours)
            },
            other => other,
        })
        .collect::<TicketPatch>();

    finish(normalized, errors)
}

/// Validate and trim comment content
pub fn validate_comment(content: &str) -> Result<String> {
    let mut errors = Vec::new();
    let content = content.trim().to_string();
    check_length("content", &content, COMMENT_MIN, COMMENT_MAX, &mut errors);
    finish(content, errors)
}
