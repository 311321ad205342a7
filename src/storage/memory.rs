use super::TicketRepository;
use crate::core::{Ticket, TicketId};
use crate::error::{Result, TicketDeskError};
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// In-process ticket storage
///
/// Reads share the lock; every write takes it exclusively, so the version
/// check in [`TicketRepository::replace`] and the write that follows are
/// atomic with respect to other writers.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    tickets: RwLock<HashMap<TicketId, Ticket>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, HashMap<TicketId, Ticket>>> {
        self.tickets
            .read()
            .map_err(|_| TicketDeskError::Storage("ticket map lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, HashMap<TicketId, Ticket>>> {
        self.tickets
            .write()
            .map_err(|_| TicketDeskError::Storage("ticket map lock poisoned".to_string()))
    }
}

impl TicketRepository for MemoryStorage {
    fn insert(&self, ticket: &Ticket) -> Result<()> {
        let mut tickets = self.write()?;
        if tickets.contains_key(&ticket.id) {
            return Err(TicketDeskError::Storage(format!(
                "ticket {} already exists",
                ticket.id
            )));
        }
        tickets.insert(ticket.id.clone(), ticket.clone());
        Ok(())
    }

    fn load(&self, id: &TicketId) -> Result<Ticket> {
        self.read()?
            .get(id)
            .cloned()
            .ok_or_else(|| TicketDeskError::TicketNotFound { id: id.to_string() })
    }

    fn load_all(&self) -> Result<Vec<Ticket>> {
        Ok(self.read()?.values().cloned().collect())
    }

    fn replace(&self, ticket: &Ticket, expected_version: u64) -> Result<()> {
        let mut tickets = self.write()?;
        let stored = tickets
            .get_mut(&ticket.id)
            .ok_or_else(|| TicketDeskError::TicketNotFound {
                id: ticket.id.to_string(),
            })?;
        if stored.version != expected_version {
            return Err(TicketDeskError::VersionMismatch {
                id: ticket.id.to_string(),
                expected: expected_version,
                found: stored.version,
            });
        }
        *stored = ticket.clone();
        Ok(())
    }

    fn delete(&self, id: &TicketId) -> Result<Ticket> {
        self.write()?
            .remove(id)
            .ok_or_else(|| TicketDeskError::TicketNotFound { id: id.to_string() })
    }
}
