use async_trait::async_trait;
use std::sync::Arc;

use super::super::{ApplicationError, Query, QueryHandler};
use crate::modules::assistant::domain::{Conversation, ConversationId};
use crate::modules::assistant::ports::ConversationStore;

/// 获取对话查询
#[derive(Debug, Clone)]
pub struct GetConversationQuery {
    pub conversation_id: ConversationId,
}

impl GetConversationQuery {
    pub fn new(conversation_id: ConversationId) -> Self {
        Self { conversation_id }
    }
}

impl Query for GetConversationQuery {
    type Response = Option<Conversation>;
}

/// 获取对话查询处理器
pub struct GetConversationHandler {
    store: Arc<dyn ConversationStore>,
}

impl GetConversationHandler {
    pub fn new(store: Arc<dyn ConversationStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl QueryHandler<GetConversationQuery> for GetConversationHandler {
    async fn handle(
        &self,
        query: GetConversationQuery,
    ) -> Result<Option<Conversation>, ApplicationError> {
        Ok(self.store.get_by_id(&query.conversation_id).await?)
    }
}
