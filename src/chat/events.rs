use super::message::Role;

/// Notifications a chat view subscribes to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatEvent {
    MessageAppended { id: String, role: Role },
    LoadingChanged(bool),
    /// The newest message should be brought into view.
    ScrollToEnd,
    TurnFailed { reason: String },
    Cleared,
}

pub type EventListener = Box<dyn Fn(&ChatEvent) + Send + Sync>;
