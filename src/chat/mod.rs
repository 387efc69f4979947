//! Conversation state and the request/response turn loop.

pub mod controller;
pub mod events;
pub mod message;
pub mod store;

pub use controller::{
    error_notice, ChatController, PendingTurn, TurnOutcome, TurnState, DEMO_MODE_BANNER,
};
pub use events::{ChatEvent, EventListener};
pub use message::{ChatMessage, Message, Role};
pub use store::ConversationStore;
