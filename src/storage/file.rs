use super::TicketRepository;
use super::lock::{FileLock, write_atomic};
use crate::core::{Ticket, TicketId};
use crate::error::{Result, TicketDeskError};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Ticket storage backed by one YAML document per ticket
///
/// Layout under the base directory:
///
/// ```text
/// tickets/<id>.yaml   ticket document
/// tickets/<id>.lock   locked while a writer holds the ticket
/// ```
///
/// Writes go to a temporary file that is renamed over the document, so
/// readers never observe a half-written ticket.
#[derive(Debug, Clone)]
pub struct FileStorage {
    base_dir: PathBuf,
}

impl FileStorage {
    pub fn new(base_dir: impl AsRef<Path>) -> Self {
        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Create the directory layout if it does not exist yet
    pub fn ensure_directories(&self) -> Result<()> {
        fs::create_dir_all(self.tickets_dir())?;
        Ok(())
    }

    fn tickets_dir(&self) -> PathBuf {
        self.base_dir.join("tickets")
    }

    fn ticket_path(&self, id: &TicketId) -> PathBuf {
        self.tickets_dir().join(format!("{id}.yaml"))
    }

    fn lock_path(&self, id: &TicketId) -> PathBuf {
        self.tickets_dir().join(format!("{id}.lock"))
    }

    fn lock(&self, id: &TicketId) -> Result<FileLock> {
        FileLock::acquire(self.lock_path(id))
    }

    fn read_ticket(path: &Path, id: &TicketId) -> Result<Ticket> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(TicketDeskError::TicketNotFound { id: id.to_string() });
            },
            Err(e) => return Err(e.into()),
        };
        Ok(serde_yaml::from_str(&content)?)
    }

    fn write_ticket(&self, ticket: &Ticket) -> Result<()> {
        let content = serde_yaml::to_string(ticket)?;
        write_atomic(&self.ticket_path(&ticket.id), &content)
    }
}

impl TicketRepository for FileStorage {
    fn insert(&self, ticket: &Ticket) -> Result<()> {
        self.ensure_directories()?;
        let _lock = self.lock(&ticket.id)?;
        if self.ticket_path(&ticket.id).exists() {
            return Err(TicketDeskError::Storage(format!(
                "ticket {} already exists",
                ticket.id
            )));
        }
        self.write_ticket(ticket)
    }

    fn load(&self, id: &TicketId) -> Result<Ticket> {
        Self::read_ticket(&self.ticket_path(id), id)
    }

    fn load_all(&self) -> Result<Vec<Ticket>> {
        let dir = self.tickets_dir();
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut tickets: Vec<Ticket> = Vec::new();
        for entry in fs::read_dir(&dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("yaml") {
                continue;
            }
            let content = match fs::read_to_string(&path) {
                Ok(content) => content,
                // deleted between read_dir and read
                Err(e) if e.kind() == ErrorKind::NotFound => continue,
                Err(e) => return Err(e.into()),
            };
            tickets.push(serde_yaml::from_str(&content)?);
        }
        Ok(tickets)
    }

    fn replace(&self, ticket: &Ticket, expected_version: u64) -> Result<()> {
        let _lock = self.lock(&ticket.id)?;
        let stored = Self::read_ticket(&self.ticket_path(&ticket.id), &ticket.id)?;
        if stored.version != expected_version {
            return Err(TicketDeskError::VersionMismatch {
                id: ticket.id.to_string(),
                expected: expected_version,
                found: stored.version,
            });
        }
        self.write_ticket(ticket)
    }

    fn delete(&self, id: &TicketId) -> Result<Ticket> {
        let _lock = self.lock(id)?;
        let path = self.ticket_path(id);
        let ticket = Self::read_ticket(&path, id)?;
        fs::remove_file(&path)?;
        // waiters on the unlinked lock will find the document gone
        if let Err(e) = fs::remove_file(self.lock_path(id)) {
            tracing::debug!("Keeping lock file for deleted ticket {}: {e}", id.short());
        }
        Ok(ticket)
    }
}
