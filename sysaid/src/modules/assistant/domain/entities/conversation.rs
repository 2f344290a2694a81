use serde::{Deserialize, Serialize};

use super::super::value_objects::ConversationId;
use super::Message;

/// 对话实体 - 聚合根
///
/// 消息列表只允许追加，插入顺序即因果顺序
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    id: ConversationId,
    title: String,
    messages: Vec<Message>,
}

impl Conversation {
    /// 创建新对话，并放入种子消息
    pub fn start(id: ConversationId, title: impl Into<String>, seed: Message) -> Self {
        Self {
            id,
            title: title.into(),
            messages: vec![seed],
        }
    }

    /// 从存储恢复
    pub fn restore(id: ConversationId, title: String, messages: Vec<Message>) -> Self {
        Self {
            id,
            title,
            messages,
        }
    }

    // Getters
    pub fn id(&self) -> &ConversationId {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn message_count(&self) -> usize {
        self.messages.len()
    }

    /// 追加消息
    pub fn add_message(&mut self, message: Message) {
        self.messages.push(message);
    }
}
