use std::sync::Arc;

use crate::agents::Agent;
use crate::db::DbError;
use crate::gateway::{Completion, CompletionGateway, GatewayError};

use super::events::{ChatEvent, EventListener};
use super::message::{ChatMessage, Message, Role};
use super::store::ConversationStore;

/// Banner prefixed to replies produced without an upstream provider.
pub const DEMO_MODE_BANNER: &str = "🎭 **[Modo Demo - Sin API Key]**";

/// Text of the assistant message appended when a turn fails.
pub fn error_notice(reason: &str) -> String {
    format!(
        "❌ **Error técnico**\n\n{}\n\n¿Podés intentar nuevamente en unos momentos?",
        reason
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnState {
    Idle,
    Awaiting { turn: u64 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    /// Blank input, or a turn was already in flight. Nothing changed.
    Rejected,
    Replied { message_id: String },
    Failed { reason: String },
    /// The chat was cleared while the request was in flight.
    Discarded,
}

/// A turn whose request has been built but not yet resolved.
#[derive(Debug)]
pub struct PendingTurn {
    turn: u64,
    epoch: u64,
    agent_id: String,
    history: Vec<ChatMessage>,
    user_message: Message,
}

impl PendingTurn {
    pub fn agent_id(&self) -> &str {
        &self.agent_id
    }

    pub fn history(&self) -> &[ChatMessage] {
        &self.history
    }

    pub async fn dispatch(
        &self,
        gateway: &dyn CompletionGateway,
    ) -> Result<Completion, GatewayError> {
        gateway.complete(&self.history, &self.agent_id).await
    }
}

struct AttachedStore {
    store: Arc<dyn ConversationStore>,
    conversation_id: String,
}

/// Owns one conversation and runs its request/response turns.
///
/// At most one turn is in flight: `send_message` holds `&mut self` across
/// the gateway call, and the two-phase [`begin_turn`](Self::begin_turn) /
/// [`complete_turn`](Self::complete_turn) pair refuses a second turn while
/// the state is `Awaiting`.
pub struct ChatController {
    agent: Agent,
    gateway: Arc<dyn CompletionGateway>,
    store: Option<AttachedStore>,
    messages: Vec<Message>,
    state: TurnState,
    error: Option<String>,
    epoch: u64,
    turns: u64,
    listener: Option<EventListener>,
}

impl ChatController {
    pub fn new(agent: Agent, gateway: Arc<dyn CompletionGateway>) -> Self {
        let messages = Message::welcome(&agent).into_iter().collect();
        Self {
            agent,
            gateway,
            store: None,
            messages,
            state: TurnState::Idle,
            error: None,
            epoch: 0,
            turns: 0,
            listener: None,
        }
    }

    /// Rebuild a conversation from the store; successful turns are appended
    /// back to it.
    pub fn resume(
        agent: Agent,
        gateway: Arc<dyn CompletionGateway>,
        store: Arc<dyn ConversationStore>,
        conversation_id: impl Into<String>,
    ) -> Result<Self, DbError> {
        let conversation_id = conversation_id.into();
        let history = store.load_messages(&conversation_id)?;
        tracing::debug!(%conversation_id, count = history.len(), "resumed conversation");

        let mut controller = Self::new(agent, gateway);
        controller.messages.extend(history);
        controller.store = Some(AttachedStore {
            store,
            conversation_id,
        });
        Ok(controller)
    }

    pub fn with_listener(mut self, listener: EventListener) -> Self {
        self.listener = Some(listener);
        self
    }

    pub fn agent(&self) -> &Agent {
        &self.agent
    }

    pub fn gateway(&self) -> Arc<dyn CompletionGateway> {
        Arc::clone(&self.gateway)
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn state(&self) -> TurnState {
        self.state
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.state, TurnState::Awaiting { .. })
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn conversation_id(&self) -> Option<&str> {
        self.store.as_ref().map(|s| s.conversation_id.as_str())
    }

    /// Send `text` and wait for the assistant's answer.
    pub async fn send_message(&mut self, text: &str) -> TurnOutcome {
        let Some(turn) = self.begin_turn(text) else {
            return TurnOutcome::Rejected;
        };
        let gateway = Arc::clone(&self.gateway);
        let result = turn.dispatch(gateway.as_ref()).await;
        self.complete_turn(turn, result)
    }

    /// Append the user message and move to `Awaiting`.
    ///
    /// Returns `None` for blank input or while another turn is in flight.
    pub fn begin_turn(&mut self, text: &str) -> Option<PendingTurn> {
        let content = text.trim();
        if content.is_empty() {
            tracing::debug!("ignoring blank message");
            return None;
        }
        if self.is_loading() {
            tracing::debug!("turn already in flight, ignoring message");
            return None;
        }

        let user_message = Message::user(content);
        self.push(user_message.clone());
        let history = self.outbound_history();

        self.turns += 1;
        self.state = TurnState::Awaiting { turn: self.turns };
        self.error = None;
        self.emit(ChatEvent::LoadingChanged(true));
        tracing::info!(agent_id = %self.agent.id, turn = self.turns, "chat turn started");

        Some(PendingTurn {
            turn: self.turns,
            epoch: self.epoch,
            agent_id: self.agent.id.clone(),
            history,
            user_message,
        })
    }

    /// Resolve a turn with the gateway's result, appending exactly one
    /// assistant message unless the chat was cleared in the meantime.
    pub fn complete_turn(
        &mut self,
        turn: PendingTurn,
        result: Result<Completion, GatewayError>,
    ) -> TurnOutcome {
        if self.state != (TurnState::Awaiting { turn: turn.turn }) {
            tracing::warn!(turn = turn.turn, "completion for a turn that is not in flight");
            return TurnOutcome::Discarded;
        }

        let outcome = if turn.epoch != self.epoch {
            tracing::debug!(turn = turn.turn, "chat cleared while awaiting, dropping reply");
            TurnOutcome::Discarded
        } else {
            match result {
                Ok(completion) if !completion.error => self.accept_reply(turn, completion),
                Ok(completion) => self.fail_turn(completion.content),
                Err(e) => self.fail_turn(e.to_string()),
            }
        };

        self.state = TurnState::Idle;
        self.emit(ChatEvent::LoadingChanged(false));
        outcome
    }

    fn accept_reply(&mut self, turn: PendingTurn, completion: Completion) -> TurnOutcome {
        let content = if completion.mock {
            format!("{}\n\n{}", DEMO_MODE_BANNER, completion.content)
        } else {
            completion.content
        };
        let mut reply = Message::assistant(content);
        reply.mock = completion.mock;
        reply.usage = completion.usage;

        self.persist(&turn.user_message, &reply);
        let message_id = reply.id.clone();
        self.push(reply);
        self.error = None;
        tracing::info!(turn = turn.turn, mock = completion.mock, "chat turn completed");
        TurnOutcome::Replied { message_id }
    }

    fn fail_turn(&mut self, reason: String) -> TurnOutcome {
        tracing::warn!(agent_id = %self.agent.id, %reason, "chat turn failed");
        self.push(Message::error(error_notice(&reason)));
        self.error = Some(reason.clone());
        self.emit(ChatEvent::TurnFailed {
            reason: reason.clone(),
        });
        TurnOutcome::Failed { reason }
    }

    /// Reset to the welcome message. A turn still in flight will be
    /// discarded when it resolves.
    pub fn clear_chat(&mut self) {
        self.messages = Message::welcome(&self.agent).into_iter().collect();
        self.error = None;
        self.epoch += 1;
        self.emit(ChatEvent::Cleared);
    }

    /// Drop trailing failures and send the most recent user message again.
    pub async fn retry_last_message(&mut self) -> TurnOutcome {
        let Some(turn) = self.begin_retry() else {
            return TurnOutcome::Rejected;
        };
        let gateway = Arc::clone(&self.gateway);
        let result = turn.dispatch(gateway.as_ref()).await;
        self.complete_turn(turn, result)
    }

    /// Two-phase form of [`retry_last_message`](Self::retry_last_message).
    pub fn begin_retry(&mut self) -> Option<PendingTurn> {
        if self.is_loading() {
            return None;
        }
        let last_user = self.messages.iter().rposition(|m| m.role == Role::User)?;
        let content = self.messages[last_user].content.clone();

        while self.messages.last().is_some_and(|m| m.is_error) {
            self.messages.pop();
        }
        // The unanswered question is re-appended by the resend.
        if self.messages.len() == last_user + 1 {
            self.messages.pop();
        }
        self.error = None;
        tracing::info!(agent_id = %self.agent.id, "retrying last message");
        self.begin_turn(&content)
    }

    /// Switch persona, regenerating the welcome message in place.
    pub fn set_agent(&mut self, agent: Agent) {
        if self.messages.first().is_some_and(Message::is_welcome) {
            self.messages.remove(0);
        }
        if let Some(welcome) = Message::welcome(&agent) {
            self.messages.insert(0, welcome);
        }
        self.agent = agent;
    }

    fn outbound_history(&self) -> Vec<ChatMessage> {
        self.messages
            .iter()
            .filter(|m| !m.is_error)
            .map(Message::to_chat_message)
            .collect()
    }

    fn push(&mut self, message: Message) {
        let event = ChatEvent::MessageAppended {
            id: message.id.clone(),
            role: message.role,
        };
        self.messages.push(message);
        self.emit(event);
        self.emit(ChatEvent::ScrollToEnd);
    }

    fn persist(&self, question: &Message, reply: &Message) {
        let Some(attached) = &self.store else {
            return;
        };
        if let Err(e) = attached
            .store
            .append_exchange(&attached.conversation_id, question, reply)
        {
            tracing::warn!(
                conversation_id = %attached.conversation_id,
                error = %e,
                "failed to persist turn"
            );
        }
    }

    fn emit(&self, event: ChatEvent) {
        if let Some(listener) = &self.listener {
            listener(&event);
        }
    }
}
