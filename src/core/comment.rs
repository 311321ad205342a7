use super::{CommentId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A comment posted on a ticket
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: CommentId,
    pub content: String,
    pub author: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Set on the first edit and never cleared
    #[serde(default)]
    pub is_edited: bool,
}

impl Comment {
    pub fn new(content: impl Into<String>, author: UserId, now: DateTime<Utc>) -> Self {
        Self {
            id: CommentId::new(),
            content: content.into(),
            author,
            created_at: now,
            updated_at: now,
            is_edited: false,
        }
    }

    /// Replace the content and mark the comment as edited
    pub fn edit(&mut self, content: impl Into<String>, now: DateTime<Utc>) {
        self.content = content.into();
        self.updated_at = now;
        self.is_edited = true;
    }
}
