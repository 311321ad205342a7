//! Identity directory
//!
//! The core never authenticates anyone. It only needs to turn a user id
//! into a role (to decide admin rights) and into display fields (to hydrate
//! tickets). [`IdentityResolver`] is that seam.

use crate::core::{Actor, Role, UserId};
use crate::error::{FieldError, Result, TicketDeskError};
use crate::storage::lock::{FileLock, write_atomic};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

/// A user record as known to the identity directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: UserId,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub role: Role,
}

impl UserProfile {
    pub fn new(
        id: impl Into<UserId>,
        name: impl Into<String>,
        email: impl Into<String>,
        role: Role,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            email: email.into(),
            role,
        }
    }

    pub fn actor(&self) -> Actor {
        Actor::new(self.id.clone(), self.role)
    }

    pub fn summary(&self) -> UserSummary {
        UserSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            email: self.email.clone(),
        }
    }

    fn validate(&self) -> Result<()> {
        let mut errors = Vec::new();
        if self.id.as_str().trim().is_empty() {
            errors.push(FieldError::new("id", "must not be empty"));
        }
        if self.name.trim().is_empty() {
            errors.push(FieldError::new("name", "must not be empty"));
        }
        if !self.email.contains('@') {
            errors.push(FieldError::new("email", "must be an email address"));
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(TicketDeskError::Validation { errors })
        }
    }
}

/// Minimal display fields stamped onto hydrated tickets
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: UserId,
    pub name: String,
    pub email: String,
}

/// Resolves user ids to profiles
#[cfg_attr(test, mockall::automock)]
pub trait IdentityResolver: Send + Sync {
    /// Look up a user; `Ok(None)` when the id is unknown
    fn resolve(&self, id: &UserId) -> Result<Option<UserProfile>>;
}

/// Resolve an id to an [`Actor`], failing if the user is unknown
pub fn resolve_actor(resolver: &dyn IdentityResolver, id: &UserId) -> Result<Actor> {
    resolver
        .resolve(id)?
        .map(|profile| profile.actor())
        .ok_or_else(|| TicketDeskError::UserNotFound { id: id.to_string() })
}

/// Directory held in memory
#[derive(Debug, Default)]
pub struct InMemoryDirectory {
    users: RwLock<HashMap<UserId, UserProfile>>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_users(users: impl IntoIterator<Item = UserProfile>) -> Self {
        let directory = Self::new();
        if let Ok(mut map) = directory.users.write() {
            map.extend(users.into_iter().map(|u| (u.id.clone(), u)));
        }
        directory
    }

    /// Insert or replace a user
    pub fn add(&self, profile: UserProfile) -> Result<()> {
        profile.validate()?;
        self.users
            .write()
            .map_err(|_| TicketDeskError::Storage("user map lock poisoned".to_string()))?
            .insert(profile.id.clone(), profile);
        Ok(())
    }
}

impl IdentityResolver for InMemoryDirectory {
    fn resolve(&self, id: &UserId) -> Result<Option<UserProfile>> {
        let users = self
            .users
            .read()
            .map_err(|_| TicketDeskError::Storage("user map lock poisoned".to_string()))?;
        Ok(users.get(id).cloned())
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct UsersFile {
    #[serde(default)]
    users: Vec<UserProfile>,
}

/// Directory stored as `users.yaml` inside the data directory
#[derive(Debug, Clone)]
pub struct FileDirectory {
    path: PathBuf,
}

impl FileDirectory {
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        Self {
            path: data_dir.as_ref().join("users.yaml"),
        }
    }

    fn read(&self) -> Result<UsersFile> {
        if !self.path.exists() {
            return Ok(UsersFile::default());
        }
        let content = fs::read_to_string(&self.path)?;
        Ok(serde_yaml::from_str(&content)?)
    }

    /// All users, sorted by id
    pub fn list(&self) -> Result<Vec<UserProfile>> {
        let mut users = self.read()?.users;
        users.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(users)
    }

    /// Insert or replace a user
    ///
    /// The read-modify-write runs under `users.yaml.lock`, so concurrent
    /// processes adding users never drop each other's entries.
    pub fn add(&self, profile: UserProfile) -> Result<()> {
        profile.validate()?;
        let _lock = FileLock::acquire(self.path.with_extension("yaml.lock"))?;
        let mut file = self.read()?;
        match file.users.iter_mut().find(|u| u.id == profile.id) {
            Some(existing) => *existing = profile,
            None => file.users.push(profile),
        }
        write_atomic(&self.path, &serde_yaml::to_string(&file)?)
    }
}

impl IdentityResolver for FileDirectory {
    fn resolve(&self, id: &UserId) -> Result<Option<UserProfile>> {
        Ok(self.read()?.users.into_iter().find(|u| &u.id == id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_resolve_actor() {
        let directory = InMemoryDirectory::with_users([
            UserProfile::new("alice", "Alice", "alice@example.com", Role::User),
            UserProfile::new("root", "Root", "root@example.com", Role::Admin),
        ]);

        let actor = resolve_actor(&directory, &UserId::from("root")).unwrap();
        assert!(actor.is_admin());

        let err = resolve_actor(&directory, &UserId::from("ghost")).unwrap_err();
        assert!(matches!(err, TicketDeskError::UserNotFound { .. }));
    }

    #[test]
    fn test_invalid_profile_rejected() {
        let directory = InMemoryDirectory::new();
        let err = directory
            .add(UserProfile::new("eve", "", "not-an-email", Role::User))
            .unwrap_err();
        assert_eq!(err.field_errors().len(), 2);
    }

    #[test]
    fn test_file_directory_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let directory = FileDirectory::new(temp_dir.path());
        assert!(directory.list().unwrap().is_empty());

        directory
            .add(UserProfile::new("bob", "Bob", "bob@example.com", Role::User))
            .unwrap();
        directory
            .add(UserProfile::new("alice", "Alice", "alice@example.com", Role::User))
            .unwrap();
        directory
            .add(UserProfile::new("bob", "Robert", "bob@example.com", Role::Admin))
            .unwrap();

        let users = directory.list().unwrap();
        assert_eq!(users.len(), 2);
        assert_eq!(users[0].id, UserId::from("alice"));

        let bob = directory.resolve(&UserId::from("bob")).unwrap().unwrap();
        assert_eq!(bob.name, "Robert");
        assert_eq!(bob.role, Role::Admin);
    }

    #[test]
    fn test_file_directory_concurrent_adds_keep_every_user() {
        let temp_dir = TempDir::new().unwrap();
        let handles: Vec<_> = (0..8)
            .map(|i| {
                // separate handles, like separate `user add` processes
                let directory = FileDirectory::new(temp_dir.path());
                std::thread::spawn(move || {
                    directory
                        .add(UserProfile::new(
                            format!("user{i}"),
                            format!("User {i}"),
                            format!("user{i}@example.com"),
                            Role::User,
                        ))
                        .unwrap();
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let users = FileDirectory::new(temp_dir.path()).list().unwrap();
        assert_eq!(users.len(), 8);
        assert!(!temp_dir.path().join("users.yaml.tmp").exists());
    }
}
