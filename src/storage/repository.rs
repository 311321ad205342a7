use crate::core::{Ticket, TicketId};
use crate::error::{Result, TicketDeskError};

/// Repository trait for ticket storage operations
///
/// Implementations provide atomic single-document reads and writes plus a
/// compare-and-swap on [`Ticket::version`], which the store uses to
/// serialize read-modify-write cycles on the same ticket.
pub trait TicketRepository: Send + Sync {
    /// Stores a brand-new ticket; fails if the id is already taken
    fn insert(&self, ticket: &Ticket) -> Result<()>;

    /// Loads a ticket by ID
    fn load(&self, id: &TicketId) -> Result<Ticket>;

    /// Loads all tickets
    fn load_all(&self) -> Result<Vec<Ticket>>;

    /// Replaces a stored ticket if its stored version still equals
    /// `expected_version`, otherwise fails with
    /// [`TicketDeskError::VersionMismatch`]
    fn replace(&self, ticket: &Ticket, expected_version: u64) -> Result<()>;

    /// Deletes a ticket by ID, returning what was removed
    fn delete(&self, id: &TicketId) -> Result<Ticket>;

    /// Checks if a ticket exists by ID
    fn exists(&self, id: &TicketId) -> Result<bool> {
        match self.load(id) {
            Ok(_) => Ok(true),
            Err(TicketDeskError::TicketNotFound { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Finds tickets matching a predicate
    fn find<F>(&self, predicate: F) -> Result<Vec<Ticket>>
    where
        F: Fn(&Ticket) -> bool,
        Self: Sized,
    {
        let tickets = self.load_all()?;
        Ok(tickets.into_iter().filter(|t| predicate(t)).collect())
    }

    /// Counts tickets matching a predicate
    fn count<F>(&self, predicate: F) -> Result<usize>
    where
        F: Fn(&Ticket) -> bool,
        Self: Sized,
    {
        let tickets = self.load_all()?;
        Ok(tickets.iter().filter(|t| predicate(t)).count())
    }
}

#[cfg(test)]
mockall::mock! {
    pub Repository {}

    impl TicketRepository for Repository {
        fn insert(&self, ticket: &Ticket) -> Result<()>;
        fn load(&self, id: &TicketId) -> Result<Ticket>;
        fn load_all(&self) -> Result<Vec<Ticket>>;
        fn replace(&self, ticket: &Ticket, expected_version: u64) -> Result<()>;
        fn delete(&self, id: &TicketId) -> Result<Ticket>;
    }
}
