use parking_lot::RwLock;
use std::collections::HashMap;

use crate::models::ChatMessage;

/// In-memory conversation history keyed by session id. Lost on restart.
pub struct SessionStore {
    sessions: RwLock<HashMap<String, Vec<ChatMessage>>>,
    max_history_turns: usize,
}

impl SessionStore {
    pub fn new(max_history_turns: usize) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            max_history_turns,
        }
    }

    /// The most recent messages of a session, oldest first.
    pub fn history(&self, session_id: &str) -> Vec<ChatMessage> {
        self.sessions
            .read()
            .get(session_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Record one exchange, dropping the oldest messages beyond
    /// `max_history_turns`.
    pub fn append(&self, session_id: &str, question: &str, answer: &str) {
        let mut sessions = self.sessions.write();
        let messages = sessions.entry(session_id.to_string()).or_default();
        messages.push(ChatMessage::user(question));
        messages.push(ChatMessage::assistant(answer));
        let excess = messages.len().saturating_sub(self.max_history_turns);
        messages.drain(..excess);
    }

    /// Returns false when the session did not exist.
    pub fn clear(&self, session_id: &str) -> bool {
        self.sessions.write().remove(session_id).is_some()
    }

    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }
}
