use std::sync::Arc;
use tracing::info;

use super::{DgraphConversationStore, InMemoryConversationStore, SqliteConversationStore};
use crate::infrastructure::config::{Settings, StorageKind};
use crate::modules::assistant::ports::{ConversationStore, RepositoryError};

/// 按存储类型创建对话存储
pub async fn create_conversation_store(
    settings: &Settings,
    kind: StorageKind,
) -> Result<Arc<dyn ConversationStore>, RepositoryError> {
    info!("Creating conversation store: kind={}", kind);

    let store: Arc<dyn ConversationStore> = match kind {
        StorageKind::Memory => Arc::new(InMemoryConversationStore::new()),
        StorageKind::Sqlite => {
            Arc::new(SqliteConversationStore::connect(&settings.sqlite_url).await?)
        }
        StorageKind::Dgraph => {
            Arc::new(DgraphConversationStore::connect(settings.dgraph_url.clone()).await?)
        }
    };

    Ok(store)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::assistant::domain::{Conversation, ConversationId, Message};

    #[tokio::test]
    async fn test_memory_store() {
        let store = create_conversation_store(&Settings::default(), StorageKind::Memory)
            .await
            .unwrap();
        assert!(store.get_by_id(&ConversationId::new()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_sqlite_store_uses_configured_url() {
        let dir = tempfile::TempDir::new().unwrap();
        let mut settings = Settings::default();
        settings.sqlite_url = format!("sqlite://{}", dir.path().join("store.db").display());

        let store = create_conversation_store(&settings, StorageKind::Sqlite)
            .await
            .unwrap();
        let conversation = Conversation::start(
            ConversationId::from("c1"),
            "Title",
            Message::new_assistant("seed"),
        );
        store.save(&conversation).await.unwrap();

        assert!(dir.path().join("store.db").exists());
        assert_eq!(
            store.get_by_id(conversation.id()).await.unwrap(),
            Some(conversation)
        );
    }
}
