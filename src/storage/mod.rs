//! Persistence backends for tickets
//!
//! [`TicketRepository`] is the seam between the ticket store and the
//! persistence layer. Two backends ship with the crate:
//!
//! - [`MemoryStorage`] keeps tickets in a lock-protected map (tests, embedding)
//! - [`FileStorage`] keeps one YAML document per ticket under a data directory

mod file;
pub(crate) mod lock;
mod memory;
pub mod repository;

pub use file::FileStorage;
pub use memory::MemoryStorage;
pub use repository::TicketRepository;

#[cfg(test)]
pub(crate) use repository::MockRepository;
