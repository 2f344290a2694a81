use serde::{Deserialize, Serialize};

use super::ConversationId;

/// 单次请求的回答
///
/// `content` 可以为空：后端没有产生最终内容时仍视为成功
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Answer {
    pub conversation_id: ConversationId,
    pub succeeded: bool,
    pub content: String,
}

impl Answer {
    pub fn success(conversation_id: ConversationId, content: impl Into<String>) -> Self {
        Self {
            conversation_id,
            succeeded: true,
            content: content.into(),
        }
    }
}
