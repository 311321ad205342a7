//! Test utilities for ticket-desk
//!
//! This module provides common test fixtures and utilities to reduce
//! duplication in test code across the codebase.

#![cfg(test)]

use crate::core::{Actor, NewTicket, Priority, Role, Ticket};
use crate::identity::{InMemoryDirectory, UserProfile};
use crate::storage::MemoryStorage;
use crate::store::TicketStore;
use std::sync::Arc;

/// An in-memory store with a small cast of users
///
/// - `alice`, `bob`: regular users who file tickets
/// - `victor`: a regular user with no relation to anyone's tickets
/// - `admin`: the `root` administrator
pub struct TestDesk {
    pub store: TicketStore<MemoryStorage>,
    pub directory: Arc<InMemoryDirectory>,
    pub alice: Actor,
    pub bob: Actor,
    pub victor: Actor,
    pub admin: Actor,
}

impl TestDesk {
    pub fn new() -> Self {
        let profiles = [
            UserProfile::new("alice", "Alice Anders", "alice@example.com", Role::User),
            UserProfile::new("bob", "Bob Brown", "bob@example.com", Role::User),
            UserProfile::new("victor", "Victor Vance", "victor@example.com", Role::User),
            UserProfile::new("root", "Root Admin", "root@example.com", Role::Admin),
        ];
        let [alice, bob, victor, admin] = profiles.each_ref().map(UserProfile::actor);

        let directory = Arc::new(InMemoryDirectory::with_users(profiles));
        let store = TicketStore::new(MemoryStorage::new(), directory.clone());

        Self {
            store,
            directory,
            alice,
            bob,
            victor,
            admin,
        }
    }

    /// Create a valid ticket through the store
    pub fn create_ticket(&self, title: &str, actor: &Actor) -> Ticket {
        self.store
            .create(sample_ticket(title), actor)
            .expect("Failed to create ticket")
    }
}

/// Valid creation input with the given title
pub fn sample_ticket(title: &str) -> NewTicket {
    NewTicket::new(
        title,
        format!("Steps to reproduce: {title}"),
        Priority::Medium,
    )
}
