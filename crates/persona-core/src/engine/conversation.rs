use crate::model::ChatMessage;

/// Ordered message log for one longitudinal test case. Exclusively owned by
/// the task executing that test case and discarded with it; the persisted
/// responses (in sequence order) are the only durable record.
#[derive(Debug, Default)]
pub struct ConversationState {
    messages: Vec<ChatMessage>,
}

impl ConversationState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_user(&mut self, content: impl Into<String>) {
        self.messages.push(ChatMessage::user(content));
    }

    pub fn push_assistant(&mut self, content: impl Into<String>) {
        self.messages.push(ChatMessage::assistant(content));
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Role;

    #[test]
    fn turns_accumulate_in_order() {
        let mut conversation = ConversationState::new();
        conversation.push_user("Q1");
        conversation.push_assistant("4");
        conversation.push_user("Q2");

        let messages = conversation.messages();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0].role, Role::User);
        assert_eq!(messages[1].role, Role::Assistant);
        assert_eq!(messages[1].content, "4");
        assert_eq!(messages[2].content, "Q2");
    }
}
