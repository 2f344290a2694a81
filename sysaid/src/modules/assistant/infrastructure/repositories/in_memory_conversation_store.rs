use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::modules::assistant::domain::{Conversation, ConversationId};
use crate::modules::assistant::ports::{ConversationStore, RepositoryError};

/// 内存对话存储
///
/// 用于开发和测试，进程退出后数据丢失
pub struct InMemoryConversationStore {
    conversations: RwLock<HashMap<ConversationId, Conversation>>,
}

impl InMemoryConversationStore {
    pub fn new() -> Self {
        Self {
            conversations: RwLock::new(HashMap::new()),
        }
    }

    /// 获取对话总数
    pub async fn count(&self) -> usize {
        let conversations = self.conversations.read().await;
        conversations.len()
    }
}

impl Default for InMemoryConversationStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ConversationStore for InMemoryConversationStore {
    async fn get_by_id(&self, id: &ConversationId) -> Result<Option<Conversation>, RepositoryError> {
        let conversations = self.conversations.read().await;
        Ok(conversations.get(id).cloned())
    }

    async fn save(&self, conversation: &Conversation) -> Result<ConversationId, RepositoryError> {
        let mut conversations = self.conversations.write().await;
        conversations.insert(conversation.id().clone(), conversation.clone());
        Ok(conversation.id().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::assistant::domain::Message;
    use std::sync::Arc;

    fn sample(id: &str) -> Conversation {
        let mut conversation =
            Conversation::start(ConversationId::from(id), "Test", Message::new_assistant("seed"));
        conversation.add_message(Message::new_user("question"));
        conversation.add_message(Message::new_assistant("answer"));
        conversation
    }

    #[tokio::test]
    async fn test_save_and_get() {
        let store = InMemoryConversationStore::new();
        let conversation = sample("c1");

        let id = store.save(&conversation).await.unwrap();
        let retrieved = store.get_by_id(&id).await.unwrap();

        assert_eq!(retrieved, Some(conversation));
    }

    #[tokio::test]
    async fn test_missing_returns_none() {
        let store = InMemoryConversationStore::new();
        let retrieved = store.get_by_id(&ConversationId::from("nope")).await.unwrap();
        assert!(retrieved.is_none());
    }

    #[tokio::test]
    async fn test_save_replaces_message_list() {
        let store = InMemoryConversationStore::new();
        let mut conversation = sample("c1");
        store.save(&conversation).await.unwrap();

        conversation.add_message(Message::new_user("again"));
        store.save(&conversation).await.unwrap();

        let retrieved = store.get_by_id(conversation.id()).await.unwrap().unwrap();
        assert_eq!(retrieved.message_count(), 4);
        assert_eq!(store.count().await, 1);
    }

    #[tokio::test]
    async fn test_concurrent_saves_to_different_ids() {
        let store = Arc::new(InMemoryConversationStore::new());

        let mut handles = Vec::new();
        for i in 0..20 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store.save(&sample(&format!("c{}", i))).await.unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(store.count().await, 20);
        for i in 0..20 {
            let id = ConversationId::from(format!("c{}", i));
            assert_eq!(store.get_by_id(&id).await.unwrap(), Some(sample(&format!("c{}", i))));
        }
    }
}
