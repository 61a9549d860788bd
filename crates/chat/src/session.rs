//! Conversation session state.

use crate::memory::ChatMemory;
use chrono::{DateTime, Utc};
use ragchat_core::{AppError, AppResult};
use ragchat_llm::ChatMessage;
use serde::Serialize;
use uuid::Uuid;

/// Whether the system role may still change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    /// No turn attempted yet
    Unlocked,
    /// A turn has been attempted; the system role is fixed
    Locked,
}

/// One completed question/answer exchange.
#[derive(Debug, Clone, Serialize)]
pub struct Turn {
    /// 1-based position in the conversation
    pub sequence: u32,
    pub question: String,
    pub answer: String,
    pub answered_at: DateTime<Utc>,
}

/// State of one conversation: system role, memory, lock, completed turns.
///
/// Sessions are plain values owned by the caller and passed `&mut` into
/// [`crate::ChatEngine::submit`].
#[derive(Debug, Clone)]
pub struct ConversationSession {
    id: Uuid,
    state: SessionState,
    memory: ChatMemory,
    turns: Vec<Turn>,
}

impl ConversationSession {
    pub fn new(max_messages: usize) -> Self {
        Self {
            id: Uuid::new_v4(),
            state: SessionState::Unlocked,
            memory: ChatMemory::new(max_messages),
            turns: Vec::new(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_locked(&self) -> bool {
        self.state == SessionState::Locked
    }

    pub fn system_role(&self) -> Option<&str> {
        self.memory.system()
    }

    /// Set the system role. Only allowed before the first turn.
    ///
    /// Clears the memory and pins `role` as the system message; a blank role
    /// leaves no system message. Once locked, returns
    /// [`AppError::Validation`] and changes nothing.
    pub fn set_system_role(&mut self, role: &str) -> AppResult<()> {
        if self.is_locked() {
            return Err(AppError::Validation(
                "The system role cannot change once the conversation has started".to_string(),
            ));
        }

        let role = role.trim();
        let system = (!role.is_empty()).then(|| role.to_string());

        tracing::debug!(session = %self.id, has_role = system.is_some(), "System role set");

        self.memory.reset(system);
        self.turns.clear();
        Ok(())
    }

    /// Completed turns, oldest first.
    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    /// Transcript of all turns, one `== User:` / `== Assistant:` block per turn.
    pub fn history_text(&self) -> String {
        let mut text = String::new();
        for turn in &self.turns {
            text.push_str("== User:\n");
            text.push_str(&turn.question);
            text.push_str("\n== Assistant:\n");
            text.push_str(&turn.answer);
            text.push('\n');
        }
        text
    }

    /// Windowed history sent with the next request.
    pub fn history(&self) -> impl Iterator<Item = &ChatMessage> {
        self.memory.messages()
    }

    pub fn memory(&self) -> &ChatMemory {
        &self.memory
    }

    pub(crate) fn lock(&mut self) {
        if self.state == SessionState::Unlocked {
            tracing::debug!(session = %self.id, "Session locked");
            self.state = SessionState::Locked;
        }
    }

    pub(crate) fn record_turn(&mut self, question: &str, answer: &str) -> &Turn {
        self.memory.push(ChatMessage::user(question));
        self.memory.push(ChatMessage::assistant(answer));

        let sequence = self.turns.len() as u32 + 1;
        self.turns.push(Turn {
            sequence,
            question: question.to_string(),
            answer: answer.to_string(),
            answered_at: Utc::now(),
        });
        &self.turns[self.turns.len() - 1]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ragchat_llm::ChatRole;

    #[test]
    fn test_new_session_is_unlocked_and_empty() {
        let session = ConversationSession::new(30);
        assert_eq!(session.state(), SessionState::Unlocked);
        assert!(session.system_role().is_none());
        assert!(session.turns().is_empty());
        assert_eq!(session.history_text(), "");
    }

    #[test]
    fn test_set_role_before_lock() {
        let mut session = ConversationSession::new(30);
        session.set_system_role("Translator").unwrap();
        session.set_system_role("  Tour guide ").unwrap();

        assert_eq!(session.system_role(), Some("Tour guide"));
        let all = session.memory().all_messages();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].role, ChatRole::System);
    }

    #[test]
    fn test_blank_role_pins_nothing() {
        let mut session = ConversationSession::new(30);
        session.set_system_role("Translator").unwrap();
        session.set_system_role("   ").unwrap();
        assert!(session.system_role().is_none());
    }

    #[test]
    fn test_role_change_rejected_after_lock() {
        let mut session = ConversationSession::new(30);
        session.set_system_role("Translator").unwrap();
        session.lock();
        session.record_turn("Hello", "Bonjour");

        let err = session.set_system_role("Other").unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(session.system_role(), Some("Translator"));
        assert_eq!(session.turns().len(), 1);
        assert_eq!(session.memory().len(), 2);
    }

    #[test]
    fn test_history_text_format() {
        let mut session = ConversationSession::new(30);
        session.lock();
        session.record_turn("Hello", "Bonjour");
        session.record_turn("Thanks", "Merci");

        assert_eq!(
            session.history_text(),
            "== User:\nHello\n== Assistant:\nBonjour\n== User:\nThanks\n== Assistant:\nMerci\n"
        );
        assert_eq!(session.turns()[1].sequence, 2);
    }

    #[test]
    fn test_history_is_bounded_but_transcript_is_not() {
        let mut session = ConversationSession::new(4);
        session.set_system_role("Assistant").unwrap();
        session.lock();
        for i in 0..5 {
            session.record_turn(&format!("q{}", i), &format!("a{}", i));
        }

        assert_eq!(session.memory().len(), 4);
        assert_eq!(session.turns().len(), 5);
        let first = session.history().next().unwrap();
        assert_eq!(first.content, "q3");
        assert_eq!(session.memory().all_messages()[0].role, ChatRole::System);
    }
}
