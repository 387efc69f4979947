use crate::db::models::Conversation;
use crate::db::DbError;

use super::message::Message;

/// Persistence the chat core reads history from and appends turns to.
///
/// Appends are safe to retry from the caller's side; the controller itself
/// never retries.
pub trait ConversationStore: Send + Sync {
    fn list_conversations(&self, user_id: &str) -> Result<Vec<Conversation>, DbError>;

    /// Messages of a conversation in insertion order.
    fn load_messages(&self, conversation_id: &str) -> Result<Vec<Message>, DbError>;

    fn append_message(&self, conversation_id: &str, message: &Message) -> Result<(), DbError>;

    /// Append a question and its answer. Stores that can, write both or
    /// neither.
    fn append_exchange(
        &self,
        conversation_id: &str,
        question: &Message,
        reply: &Message,
    ) -> Result<(), DbError> {
        self.append_message(conversation_id, question)?;
        self.append_message(conversation_id, reply)
    }
}
