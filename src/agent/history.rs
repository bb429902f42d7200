//! Conversation history owned by a session.

use crate::types::Message;

/// Ordered conversation, starting with exactly one system message.
///
/// Only [`History::record_exchange`] appends, so a failed query never
/// leaves partial turns behind.
#[derive(Debug, Clone, PartialEq)]
pub struct History {
    messages: Vec<Message>,
}

impl History {
    pub fn new(system_prompt: impl Into<String>) -> Self {
        Self {
            messages: vec![Message::system(system_prompt)],
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// True when nothing beyond the system message has been recorded.
    pub fn is_empty(&self) -> bool {
        self.messages.len() <= 1
    }

    pub fn system_prompt(&self) -> &str {
        self.messages[0].content()
    }

    /// Append a completed question and its final answer.
    pub fn record_exchange(&mut self, query: impl Into<String>, answer: impl Into<String>) {
        self.messages.push(Message::human(query));
        self.messages.push(Message::ai(answer, Vec::new()));
    }

    /// Drop everything but the system message.
    pub fn reset(&mut self) {
        self.messages.truncate(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_with_a_single_system_message() {
        let history = History::new("be helpful");
        assert_eq!(history.len(), 1);
        assert!(history.messages()[0].is_system());
        assert_eq!(history.system_prompt(), "be helpful");
        assert!(history.is_empty());
    }

    #[test]
    fn exchanges_append_in_order_and_reset_keeps_system() {
        let mut history = History::new("sys");
        history.record_exchange("q1", "a1");
        history.record_exchange("q2", "a2");
        assert_eq!(history.len(), 5);
        assert!(history.messages()[3].is_human());
        assert_eq!(history.messages()[4].content(), "a2");

        history.reset();
        assert_eq!(history.len(), 1);
        assert_eq!(history.system_prompt(), "sys");
    }
}
