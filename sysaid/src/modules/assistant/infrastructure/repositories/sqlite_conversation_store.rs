// SQLite 对话存储实现
//
// 两张表：conversations 保存 ID 和标题，messages 以自增主键记录插入顺序。
// 读取时一次性加载全部消息并按自增主键排序。

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::Row;
use std::str::FromStr;
use tracing::{debug, info};

use crate::modules::assistant::domain::{Conversation, ConversationId, Message, Sender};
use crate::modules::assistant::ports::{ConversationStore, RepositoryError};

/// 建表语句
pub const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS conversations (
    id TEXT PRIMARY KEY NOT NULL,
    title TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS messages (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    conversation_id TEXT NOT NULL,
    sender TEXT NOT NULL,
    content TEXT NOT NULL,

    FOREIGN KEY (conversation_id) REFERENCES conversations(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_messages_conversation ON messages(conversation_id, id);
"#;

fn db_error(e: sqlx::Error) -> RepositoryError {
    RepositoryError::DatabaseError(e.to_string())
}

/// SQLite 对话存储
pub struct SqliteConversationStore {
    pool: SqlitePool,
}

impl SqliteConversationStore {
    /// 连接数据库文件（不存在时创建）并初始化表结构
    pub async fn connect(url: &str) -> Result<Self, RepositoryError> {
        let options = SqliteConnectOptions::from_str(url)
            .map_err(|e| RepositoryError::ConnectionError(e.to_string()))?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .map_err(|e| RepositoryError::ConnectionError(e.to_string()))?;

        info!("Connected to SQLite: url={}", url);
        Self::with_pool(pool).await
    }

    /// 内存数据库（用于测试）
    ///
    /// 每个连接对应独立的内存库，所以只保留一个常驻连接
    pub async fn in_memory() -> Result<Self, RepositoryError> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .map_err(|e| RepositoryError::ConnectionError(e.to_string()))?
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .map_err(|e| RepositoryError::ConnectionError(e.to_string()))?;

        Self::with_pool(pool).await
    }

    /// 使用已有连接池
    pub async fn with_pool(pool: SqlitePool) -> Result<Self, RepositoryError> {
        sqlx::raw_sql(SCHEMA).execute(&pool).await.map_err(db_error)?;
        Ok(Self { pool })
    }
}

#[async_trait]
impl ConversationStore for SqliteConversationStore {
    async fn get_by_id(&self, id: &ConversationId) -> Result<Option<Conversation>, RepositoryError> {
        debug!("Get conversation by id: id={}", id);

        let row = sqlx::query("SELECT id, title FROM conversations WHERE id = ?1")
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?;

        let Some(row) = row else {
            return Ok(None);
        };
        let title: String = row.try_get("title").map_err(db_error)?;

        let rows = sqlx::query(
            "SELECT sender, content FROM messages WHERE conversation_id = ?1 ORDER BY id ASC",
        )
        .bind(id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        let mut messages = Vec::with_capacity(rows.len());
        for row in rows {
            let sender: String = row.try_get("sender").map_err(db_error)?;
            let content: String = row.try_get("content").map_err(db_error)?;
            let sender = sender
                .parse::<Sender>()
                .map_err(|e| RepositoryError::SerializationError(e.to_string()))?;
            messages.push(Message::new(sender, content));
        }

        Ok(Some(Conversation::restore(id.clone(), title, messages)))
    }

    async fn save(&self, conversation: &Conversation) -> Result<ConversationId, RepositoryError> {
        debug!(
            "Save conversation: id={}, messages={}",
            conversation.id(),
            conversation.message_count()
        );

        let mut tx = self.pool.begin().await.map_err(db_error)?;

        sqlx::query(
            "INSERT INTO conversations (id, title) VALUES (?1, ?2)
             ON CONFLICT(id) DO UPDATE SET title = excluded.title",
        )
        .bind(conversation.id().as_str())
        .bind(conversation.title())
        .execute(&mut *tx)
        .await
        .map_err(db_error)?;

        sqlx::query("DELETE FROM messages WHERE conversation_id = ?1")
            .bind(conversation.id().as_str())
            .execute(&mut *tx)
            .await
            .map_err(db_error)?;

        for message in conversation.messages() {
            sqlx::query("INSERT INTO messages (conversation_id, sender, content) VALUES (?1, ?2, ?3)")
                .bind(conversation.id().as_str())
                .bind(message.sender().as_str())
                .bind(message.content())
                .execute(&mut *tx)
                .await
                .map_err(db_error)?;
        }

        tx.commit().await.map_err(db_error)?;
        Ok(conversation.id().clone())
    }
}
