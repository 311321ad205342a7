//! Error types for ticket-desk
//!
//! Every failure the core can report maps onto one [`TicketDeskError`]
//! variant, and every variant has a stable [`kind`](TicketDeskError::kind)
//! string that callers can use when building structured responses.

use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Result type alias used throughout the crate
pub type Result<T> = std::result::Result<T, TicketDeskError>;

/// A single violated field constraint
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    /// Name of the offending field
    pub field: String,
    /// Human-readable reason
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Main error type for ticket-desk
#[derive(Error, Debug)]
pub enum TicketDeskError {
    /// One or more fields violate their constraints
    #[error("Validation failed: {}", format_field_errors(.errors))]
    Validation { errors: Vec<FieldError> },

    /// Ticket does not exist
    #[error("Ticket not found: {id}")]
    TicketNotFound { id: String },

    /// Comment does not exist on the ticket
    #[error("Comment not found: {id}")]
    CommentNotFound { id: String },

    /// User is unknown to the identity directory
    #[error("User not found: {id}")]
    UserNotFound { id: String },

    /// Actor lacks permission for the requested operation
    #[error("Forbidden: not allowed to {action}")]
    Forbidden { action: String },

    /// The stored document moved past the version a writer loaded
    #[error("Ticket {id} changed underneath the write (expected version {expected}, found {found})")]
    VersionMismatch { id: String, expected: u64, found: u64 },

    /// Concurrent writers kept invalidating the snapshot
    #[error("Ticket {id} was modified concurrently; giving up after {attempts} attempts")]
    Conflict { id: String, attempts: u32 },

    /// The injected rate limiter rejected the actor
    #[error("Rate limit exceeded for {key}; retry in {retry_after_secs}s")]
    RateLimited { key: String, retry_after_secs: u64 },

    /// Opaque persistence failure
    #[error("Storage error: {0}")]
    Storage(String),

    /// IO errors from the file backends
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML (de)serialization errors from the file backends
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_yaml::Error),

    /// JSON output errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration loading errors
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// Malformed user input that is not a field constraint (e.g. an unknown status name)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Custom error with message
    #[error("{0}")]
    Custom(String),
}

fn format_field_errors(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl TicketDeskError {
    /// Create a custom error with a message
    pub fn custom(msg: impl Into<String>) -> Self {
        Self::Custom(msg.into())
    }

    /// Create a validation error for a single field
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            errors: vec![FieldError::new(field, message)],
        }
    }

    /// Create a forbidden error naming the attempted action
    pub fn forbidden(action: impl Into<String>) -> Self {
        Self::Forbidden {
            action: action.into(),
        }
    }

    /// Stable machine-readable kind of this error
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "validation",
            Self::TicketNotFound { .. } | Self::CommentNotFound { .. } | Self::UserNotFound { .. } => {
                "not_found"
            },
            Self::Forbidden { .. } => "forbidden",
            Self::Conflict { .. } | Self::VersionMismatch { .. } => "conflict",
            Self::RateLimited { .. } => "rate_limited",
            Self::Storage(_) | Self::Io(_) | Self::Serialization(_) | Self::Json(_) => "storage",
            Self::Config(_) => "config",
            Self::InvalidInput(_) | Self::Custom(_) => "invalid_input",
        }
    }

    /// Field errors carried by a validation failure
    pub fn field_errors(&self) -> &[FieldError] {
        match self {
            Self::Validation { errors } => errors,
            _ => &[],
        }
    }

    /// Check if this error is recoverable by retrying the same call
    pub const fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Conflict { .. } | Self::VersionMismatch { .. } | Self::RateLimited { .. }
        )
    }

    /// Check if this error is related to configuration
    pub const fn is_config_error(&self) -> bool {
        matches!(self, Self::Config(_))
    }

    /// Get a user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation { errors } if errors.len() > 1 => {
                let lines: Vec<String> = errors.iter().map(|e| format!("  - {e}")).collect();
                format!("Validation failed:\n{}", lines.join("\n"))
            },
            _ => self.to_string(),
        }
    }

    /// Get suggestions for fixing the error
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            Self::TicketNotFound { .. } => vec![
                "Run 'ticket-desk list' to see the tickets you can access".to_string(),
            ],
            Self::UserNotFound { .. } => vec![
                "Run 'ticket-desk user list' to see known users".to_string(),
                "Add the user with 'ticket-desk user add <id> --name <name> --email <email>'"
                    .to_string(),
            ],
            Self::Forbidden { .. } => vec![
                "Only the ticket author or an administrator can do this".to_string(),
                "Use --as to act as a different user".to_string(),
            ],
            Self::Conflict { .. } | Self::RateLimited { .. } => {
                vec!["Wait a moment and try again".to_string()]
            },
            Self::Config(_) => vec![
                "Check ticket-desk.yaml in the data directory".to_string(),
                "Check TICKET_DESK__* environment variables".to_string(),
            ],
            _ => vec![],
        }
    }
}
