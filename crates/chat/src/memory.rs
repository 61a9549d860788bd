//! Sliding-window conversation memory.

use ragchat_llm::{ChatMessage, ChatRole};
use std::collections::VecDeque;

/// Message window with an optional pinned system message.
///
/// Only user and assistant messages count toward the window; the pinned
/// system message is never evicted.
#[derive(Debug, Clone)]
pub struct ChatMemory {
    system: Option<String>,
    messages: VecDeque<ChatMessage>,
    max_messages: usize,
}

impl ChatMemory {
    pub fn new(max_messages: usize) -> Self {
        Self {
            system: None,
            messages: VecDeque::new(),
            max_messages: max_messages.max(1),
        }
    }

    /// Clear all messages and pin `system` (if any).
    pub fn reset(&mut self, system: Option<String>) {
        self.messages.clear();
        self.system = system;
    }

    pub fn system(&self) -> Option<&str> {
        self.system.as_deref()
    }

    /// Append a message, evicting the oldest ones beyond the window.
    ///
    /// After an eviction the window never opens with an assistant message,
    /// so an odd window may hold one message less than its maximum.
    pub fn push(&mut self, message: ChatMessage) {
        self.messages.push_back(message);
        if self.messages.len() <= self.max_messages {
            return;
        }

        while self.messages.len() > self.max_messages {
            self.messages.pop_front();
        }
        while self
            .messages
            .front()
            .is_some_and(|m| m.role == ChatRole::Assistant)
        {
            self.messages.pop_front();
        }
    }

    /// Windowed user/assistant messages, oldest first.
    pub fn messages(&self) -> impl Iterator<Item = &ChatMessage> {
        self.messages.iter()
    }

    /// Full view: pinned system message first, then the window.
    pub fn all_messages(&self) -> Vec<ChatMessage> {
        self.system
            .iter()
            .map(|s| ChatMessage::system(s.clone()))
            .chain(self.messages.iter().cloned())
            .collect()
    }

    /// Number of windowed (non-pinned) messages.
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn max_messages(&self) -> usize {
        self.max_messages
    }
}
