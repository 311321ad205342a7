//! ticket-desk - support ticket tracking with a full audit trail
//!
//! This crate provides the core of a ticket tracker:
//! - A ticket store with lifecycle operations, comments and assignment
//! - A history engine recording one audit entry per changed field
//! - Statistics over the whole ticket base
//! - Pure access-policy predicates for users and administrators

// Allow missing error documentation for internal implementations
#![allow(clippy::missing_errors_doc)]
// Allow some pedantic lints that don't improve code quality
#![allow(clippy::option_if_let_else)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::redundant_closure_for_method_calls)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::wildcard_imports)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::fn_params_excessive_bools)]
#![allow(clippy::indexing_slicing)]

//! # Concurrent Safety
//!
//! Every mutation is a read-modify-write cycle guarded by a per-ticket
//! version number. A writer that loses the race re-runs its permission
//! checks, validation and diff against the fresh ticket, so concurrent
//! updates are never lost and history is never computed against a stale
//! snapshot.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use ticket_desk::core::{Actor, NewTicket, Priority, Role, Status, TicketPatch};
//! use ticket_desk::identity::{InMemoryDirectory, UserProfile};
//! use ticket_desk::storage::MemoryStorage;
//! use ticket_desk::store::TicketStore;
//!
//! # fn main() -> ticket_desk::Result<()> {
//! let directory = Arc::new(InMemoryDirectory::with_users([
//!     UserProfile::new("alice", "Alice", "alice@example.com", Role::User),
//!     UserProfile::new("root", "Root", "root@example.com", Role::Admin),
//! ]));
//! let store = TicketStore::new(MemoryStorage::new(), directory);
//!
//! let alice = Actor::user("alice");
//! let ticket = store.create(
//!     NewTicket::new("Login broken", "Cannot log in since update", Priority::High),
//!     &alice,
//! )?;
//!
//! let ticket = store.update(
//!     &ticket.id,
//!     TicketPatch::new().status(Status::InProgress),
//!     &Actor::admin("root"),
//! )?;
//! assert_eq!(ticket.history.len(), 2);
//! # Ok(())
//! # }
//! ```

pub mod audit;
pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod identity;
pub mod policy;
pub mod rate_limit;
pub mod stats;
pub mod storage;
pub mod store;

#[cfg(test)]
pub mod test_utils;

// Re-export commonly used types
pub use error::{Result, TicketDeskError};
