use async_trait::async_trait;
use thiserror::Error;

use super::super::domain::{Conversation, ConversationId};

/// 仓储错误类型
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Connection error: {0}")]
    ConnectionError(String),
}

/// 对话存储端口
///
/// 所有存储实现共享同一契约：
/// - `get_by_id` 未命中时返回 `Ok(None)`
/// - `save` 是按 ID 的整体覆盖写入，消息列表完全替换
/// - 保存后立即读取，得到的 ID、标题和有序消息与保存时一致
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// 根据 ID 获取对话
    async fn get_by_id(&self, id: &ConversationId) -> Result<Option<Conversation>, RepositoryError>;

    /// 保存对话（创建或整体替换）
    async fn save(&self, conversation: &Conversation) -> Result<ConversationId, RepositoryError>;
}
