use super::{Outcome, TicketStore};
use crate::core::validation::validate_comment;
use crate::core::{Actor, Comment, CommentId, HistoryEntry, Ticket, TicketId};
use crate::error::{Result, TicketDeskError};
use crate::policy;
use crate::storage::TicketRepository;

impl<R: TicketRepository> TicketStore<R> {
    /// Append a comment and a `commented` history entry
    pub fn add_comment(&self, ticket_id: &TicketId, content: &str, actor: &Actor) -> Result<Ticket> {
        self.throttle(actor)?;

        let (ticket, comment_id) = self.modify(ticket_id, |ticket, now| {
            if !policy::can_comment(actor, ticket) {
                return Err(TicketDeskError::forbidden("comment on this ticket"));
            }
            let content = validate_comment(content)?;

            let comment = Comment::new(content, actor.id.clone(), now);
            let id = comment.id.clone();
            ticket.comments.push(comment);
            ticket.history.push(HistoryEntry::commented(actor.id.clone(), now));
            ticket.updated_at = now;
            Ok(Outcome::Changed(id))
        })?;

        tracing::info!(
            "Comment {} added to ticket {} by {}",
            comment_id.short(),
            ticket_id.short(),
            actor.id
        );
        Ok(ticket)
    }

    /// Replace a comment's content; no history entry is recorded
    pub fn update_comment(
        &self,
        ticket_id: &TicketId,
        comment_id: &CommentId,
        content: &str,
        actor: &Actor,
    ) -> Result<Comment> {
        self.throttle(actor)?;

        let (_, comment) = self.modify(ticket_id, |ticket, now| {
            let comment = find_comment_mut(ticket, comment_id)?;
            if !policy::can_edit_comment(actor, comment) {
                return Err(TicketDeskError::forbidden("edit this comment"));
            }
            let content = validate_comment(content)?;

            comment.edit(content, now);
            let edited = comment.clone();
            ticket.updated_at = now;
            Ok(Outcome::Changed(edited))
        })?;

        tracing::info!("Comment {} edited by {}", comment_id.short(), actor.id);
        Ok(comment)
    }

    /// Remove a comment; no history entry is recorded
    pub fn delete_comment(&self, ticket_id: &TicketId, comment_id: &CommentId, actor: &Actor) -> Result<Ticket> {
        self.throttle(actor)?;

        let (ticket, ()) = self.modify(ticket_id, |ticket, now| {
            let comment = find_comment_mut(ticket, comment_id)?;
            if !policy::can_edit_comment(actor, comment) {
                return Err(TicketDeskError::forbidden("delete this comment"));
            }

            ticket.comments.retain(|c| &c.id != comment_id);
            ticket.updated_at = now;
            Ok(Outcome::Changed(()))
        })?;

        tracing::info!("Comment {} deleted by {}", comment_id.short(), actor.id);
        Ok(ticket)
    }
}

fn find_comment_mut<'a>(ticket: &'a mut Ticket, id: &CommentId) -> Result<&'a mut Comment> {
    ticket
        .comments
        .iter_mut()
        .find(|c| &c.id == id)
        .ok_or_else(|| TicketDeskError::CommentNotFound { id: id.to_string() })
}

#[cfg(test)]
mod tests {
    use crate::core::{CommentId, HistoryAction, Status, TicketPatch};
    use crate::test_utils::TestDesk;

    #[test]
    fn test_comment_length_boundary() {
        let desk = TestDesk::new();
        let ticket = desk.create_ticket("Login broken", &desk.alice);

        let err = desk.store.add_comment(&ticket.id, "ok", &desk.alice).unwrap_err();
        assert_eq!(err.kind(), "validation");

        let ticket = desk.store.add_comment(&ticket.id, "ok!", &desk.alice).unwrap();
        assert_eq!(ticket.comments_count(), 1);
        let last = ticket.history.last().unwrap();
        assert_eq!(last.action, HistoryAction::Commented);
        assert_eq!(last.user, desk.alice.id);
    }

    #[test]
    fn test_closed_ticket_only_admin_comments() {
        let desk = TestDesk::new();
        let ticket = desk.create_ticket("Login broken", &desk.alice);
        desk.store
            .update(&ticket.id, TicketPatch::new().status(Status::Closed), &desk.alice)
            .unwrap();

        let err = desk
            .store
            .add_comment(&ticket.id, "Still broken", &desk.alice)
            .unwrap_err();
        assert_eq!(err.kind(), "forbidden");
        assert!(desk.store.add_comment(&ticket.id, "Closing note", &desk.admin).is_ok());
    }

    #[test]
    fn test_edit_and_delete_comment() {
        let desk = TestDesk::new();
        let ticket = desk.create_ticket("Login broken", &desk.alice);
        let ticket = desk.store.add_comment(&ticket.id, "First take", &desk.alice).unwrap();
        let comment_id = ticket.comments[0].id.clone();
        let history_len = ticket.history.len();

        let err = desk
            .store
            .update_comment(&ticket.id, &comment_id, "Hijacked", &desk.bob)
            .unwrap_err();
        assert_eq!(err.kind(), "forbidden");

        let edited = desk
            .store
            .update_comment(&ticket.id, &comment_id, "Second take", &desk.alice)
            .unwrap();
        assert!(edited.is_edited);
        assert_eq!(edited.content, "Second take");

        let err = desk
            .store
            .delete_comment(&ticket.id, &CommentId::new(), &desk.admin)
            .unwrap_err();
        assert_eq!(err.kind(), "not_found");

        let ticket = desk.store.delete_comment(&ticket.id, &comment_id, &desk.admin).unwrap();
        assert!(ticket.comments.is_empty());
        assert_eq!(ticket.history.len(), history_len, "comment edits are not audited");
    }
}
