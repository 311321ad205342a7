//! Base handler utilities for common operations
//!
//! This module provides shared functionality used across all command handlers
//! to reduce code duplication and ensure consistency.

use crate::cli::OutputFormatter;
use crate::config::Config;
use crate::core::{Actor, CommentId, Ticket, TicketId, UserId};
use crate::error::{Result, TicketDeskError};
use crate::identity::{FileDirectory, resolve_actor};
use crate::policy;
use crate::rate_limit::RateLimiter;
use crate::storage::{FileStorage, TicketRepository};
use crate::store::TicketStore;
use chrono::{DateTime, NaiveDate, Utc};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Context for handler operations
///
/// Encapsulates configuration, storage and the acting user for one
/// invocation of the CLI.
pub struct HandlerContext {
    pub data_dir: PathBuf,
    pub config: Config,
    pub directory: Arc<FileDirectory>,
    pub store: TicketStore<FileStorage>,
    pub formatter: OutputFormatter,
    acting_user: Option<UserId>,
}

impl HandlerContext {
    /// Load configuration and open the data directory, creating it if needed
    pub fn new(data_dir: Option<&Path>, acting_user: Option<&str>, formatter: OutputFormatter) -> Result<Self> {
        let requested = data_dir.map_or_else(Config::default_data_dir, Path::to_path_buf);
        let config = Config::load(&requested)?;
        let data_dir = config.data_dir();

        let storage = FileStorage::new(&data_dir);
        storage.ensure_directories()?;
        let directory = Arc::new(FileDirectory::new(&data_dir));

        let mut store =
            TicketStore::new(storage, directory.clone()).with_options(config.store_options());
        if config.rate_limit.enabled {
            store = store.with_rate_limiter(RateLimiter::new(config.rate_limit.policy()));
        }

        tracing::debug!("Using data directory {}", data_dir.display());
        Ok(Self {
            data_dir,
            config,
            directory,
            store,
            formatter,
            acting_user: acting_user.map(UserId::from),
        })
    }

    /// The acting user, resolved through the user directory
    pub fn actor(&self) -> Result<Actor> {
        let id = self.acting_user.as_ref().ok_or_else(|| {
            TicketDeskError::InvalidInput(
                "No acting user. Pass --as <user-id> or set TICKET_DESK_USER".to_string(),
            )
        })?;
        resolve_actor(self.directory.as_ref(), id)
    }

    /// Resolve a ticket reference: a full id or a unique id prefix
    ///
    /// Prefixes only match tickets the actor can view.
    pub fn resolve_ticket_ref(&self, ticket_ref: &str, actor: &Actor) -> Result<TicketId> {
        if let Ok(id) = TicketId::parse_str(ticket_ref) {
            return Ok(id);
        }

        let prefix = ticket_ref.trim().to_lowercase();
        if prefix.is_empty() {
            return Err(TicketDeskError::InvalidInput("Empty ticket reference".to_string()));
        }
        let matches: Vec<TicketId> = self
            .store
            .repository()
            .find(|t| policy::can_view(actor, t) && t.id.to_string().starts_with(&prefix))?
            .into_iter()
            .map(|t| t.id)
            .collect();

        match matches.as_slice() {
            [id] => Ok(id.clone()),
            [] => Err(TicketDeskError::TicketNotFound {
                id: ticket_ref.to_string(),
            }),
            _ => Err(TicketDeskError::InvalidInput(format!(
                "Ticket reference '{ticket_ref}' is ambiguous ({} matches)",
                matches.len()
            ))),
        }
    }

    pub fn success(&self, message: &str) {
        self.formatter.success(message);
    }

    pub fn info(&self, message: &str) {
        self.formatter.info(message);
    }

    pub fn warning(&self, message: &str) {
        self.formatter.warning(message);
    }
}

/// Resolve a comment reference on a loaded ticket: full id or unique prefix
pub fn resolve_comment_ref(ticket: &Ticket, comment_ref: &str) -> Result<CommentId> {
    if let Ok(id) = CommentId::parse_str(comment_ref) {
        return Ok(id);
    }
    let prefix = comment_ref.trim().to_lowercase();
    let mut matches = ticket
        .comments
        .iter()
        .filter(|c| !prefix.is_empty() && c.id.to_string().starts_with(&prefix));
    match (matches.next(), matches.next()) {
        (Some(comment), None) => Ok(comment.id.clone()),
        (None, _) => Err(TicketDeskError::CommentNotFound {
            id: comment_ref.to_string(),
        }),
        (Some(_), Some(_)) => Err(TicketDeskError::InvalidInput(format!(
            "Comment reference '{comment_ref}' is ambiguous"
        ))),
    }
}

/// Common parsing functions for command arguments
pub mod parse {
    use super::*;
    use std::str::FromStr;

    /// Parse an enum-like argument, mapping its error to `InvalidInput`
    pub fn value<T>(raw: &str) -> Result<T>
    where
        T: FromStr<Err = String>,
    {
        raw.parse().map_err(TicketDeskError::InvalidInput)
    }

    /// Parse a due date given as RFC 3339 or as a plain `YYYY-MM-DD` date
    /// (meaning the end of that day, UTC)
    pub fn due_date(raw: &str) -> Result<DateTime<Utc>> {
        let raw = raw.trim();
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Ok(dt.with_timezone(&Utc));
        }
        NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .ok()
            .and_then(|date| date.and_hms_opt(23, 59, 59))
            .map(|naive| naive.and_utc())
            .ok_or_else(|| {
                TicketDeskError::InvalidInput(format!(
                    "Invalid due date '{raw}'. Use YYYY-MM-DD or an RFC 3339 timestamp"
                ))
            })
    }
}

/// Format datetime for display
pub fn format_datetime(dt: DateTime<Utc>) -> String {
    dt.with_timezone(&chrono::Local)
        .format("%Y-%m-%d %H:%M")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{NewTicket, Priority, Role, Status};
    use crate::identity::UserProfile;
    use chrono::{Datelike, Timelike};
    use tempfile::TempDir;

    fn context(temp_dir: &TempDir, user: Option<&str>) -> HandlerContext {
        HandlerContext::new(Some(temp_dir.path()), user, OutputFormatter::default())
            .expect("Failed to create context")
    }

    #[test]
    fn test_handler_context_initialization() {
        let temp_dir = TempDir::new().unwrap();
        let ctx = context(&temp_dir, None);
        assert_eq!(ctx.data_dir, temp_dir.path());
        assert!(temp_dir.path().join("tickets").is_dir());
        assert_eq!(ctx.actor().unwrap_err().kind(), "invalid_input");
    }

    #[test]
    fn test_actor_resolution() {
        let temp_dir = TempDir::new().unwrap();
        let ctx = context(&temp_dir, Some("root"));
        assert_eq!(ctx.actor().unwrap_err().kind(), "not_found");

        ctx.directory
            .add(UserProfile::new("root", "Root", "root@example.com", Role::Admin))
            .unwrap();
        assert!(ctx.actor().unwrap().is_admin());
    }

    #[test]
    fn test_resolve_ticket_by_prefix() {
        let temp_dir = TempDir::new().unwrap();
        let ctx = context(&temp_dir, None);
        let ticket = ctx
            .store
            .create(
                NewTicket::new("Login broken", "Cannot log in since update", Priority::High),
                &Actor::user("alice"),
            )
            .unwrap();

        let alice = Actor::user("alice");
        assert_eq!(ctx.resolve_ticket_ref(&ticket.id.short(), &alice).unwrap(), ticket.id);
        assert_eq!(ctx.resolve_ticket_ref(&ticket.id.to_string(), &alice).unwrap(), ticket.id);
        assert_eq!(ctx.resolve_ticket_ref("zzzz", &alice).unwrap_err().kind(), "not_found");
    }

    #[test]
    fn test_prefix_resolution_ignores_hidden_tickets() {
        let temp_dir = TempDir::new().unwrap();
        let ctx = context(&temp_dir, None);
        let alice = Actor::user("alice");
        let bob = Actor::user("bob");
        let new_ticket = |title: &str, actor: &Actor| {
            ctx.store
                .create(NewTicket::new(title, "Cannot log in since update", Priority::High), actor)
                .unwrap()
        };
        let mine = new_ticket("Alice's ticket", &alice);
        let theirs = new_ticket("Bob's ticket", &bob);

        // one visible match at most, so never ambiguous for alice
        let their_id = theirs.id.to_string();
        match ctx.resolve_ticket_ref(&their_id[..1], &alice) {
            Ok(id) => assert_eq!(id, mine.id),
            Err(err) => assert_eq!(err.kind(), "not_found"),
        }

        // hidden from alice, visible to its author and to admins
        let err = ctx.resolve_ticket_ref(&theirs.id.short(), &alice).unwrap_err();
        assert_eq!(err.kind(), "not_found");
        assert_eq!(ctx.resolve_ticket_ref(&theirs.id.short(), &bob).unwrap(), theirs.id);
        assert_eq!(
            ctx.resolve_ticket_ref(&theirs.id.short(), &Actor::admin("root")).unwrap(),
            theirs.id
        );
    }

    #[test]
    fn test_parse_helpers() {
        assert_eq!(parse::value::<Status>("in-progress").unwrap(), Status::InProgress);
        assert_eq!(parse::value::<Priority>("urgent").unwrap_err().kind(), "invalid_input");

        let due = parse::due_date("2030-05-17").unwrap();
        assert_eq!((due.year(), due.month(), due.day(), due.hour()), (2030, 5, 17, 23));
        assert!(parse::due_date("2030-05-17T09:00:00+02:00").is_ok());
        assert!(parse::due_date("next week").is_err());
    }
}
