use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::super::{ApplicationError, Command, CommandHandler};
use crate::modules::assistant::domain::{
    Answer, ConversationFactory, ConversationId, Message, SystemContext,
};
use crate::modules::assistant::ports::{ConversationStore, ReasoningBackend};

/// 请求系统帮助命令
#[derive(Debug, Clone)]
pub struct RequestSystemHelpCommand {
    /// 用户消息内容
    pub message: String,
    /// 环境上下文（仅在创建对话时使用）
    pub system_context: SystemContext,
    /// 对话 ID（可选）
    pub conversation_id: Option<ConversationId>,
}

impl RequestSystemHelpCommand {
    pub fn new(
        message: impl Into<String>,
        system_context: SystemContext,
        conversation_id: Option<ConversationId>,
    ) -> Self {
        Self {
            message: message.into(),
            system_context,
            conversation_id,
        }
    }
}

impl Command for RequestSystemHelpCommand {
    type Response = Answer;
}

/// 对话服务
///
/// 单次请求的唯一编排路径：加载或创建对话 → 追加用户消息 → 调用推理后端
/// → 追加回答 → 持久化。不做重试，只在对话不存在时自行恢复。
pub struct ConversationService {
    store: Arc<dyn ConversationStore>,
    backend: Arc<dyn ReasoningBackend>,
    factory: ConversationFactory,
}

impl ConversationService {
    pub fn new(store: Arc<dyn ConversationStore>, backend: Arc<dyn ReasoningBackend>) -> Self {
        Self {
            store,
            backend,
            factory: ConversationFactory::new(),
        }
    }

    /// 在对话中回应一条用户消息
    pub async fn respond(
        &self,
        user_text: &str,
        system_context: &SystemContext,
        conversation_id: Option<ConversationId>,
    ) -> Result<Answer, ApplicationError> {
        if user_text.is_empty() {
            return Err(ApplicationError::ValidationError(
                "Message content cannot be empty".to_string(),
            ));
        }

        let existing = match &conversation_id {
            Some(id) => self.store.get_by_id(id).await?,
            None => None,
        };

        let mut conversation = match existing {
            Some(conversation) => {
                debug!(
                    "Loaded conversation: id={}, messages={}",
                    conversation.id(),
                    conversation.message_count()
                );
                conversation
            }
            None => {
                let conversation = self
                    .factory
                    .create(conversation_id, user_text, system_context);
                info!("Created conversation: id={}", conversation.id());
                conversation
            }
        };

        conversation.add_message(Message::new_user(user_text));

        let answer = self
            .backend
            .chat(conversation.id(), conversation.messages())
            .await?;

        if answer.content.is_empty() {
            warn!(
                "Backend {} produced no terminal content: conversation_id={}",
                self.backend.backend_id(),
                conversation.id()
            );
        } else {
            conversation.add_message(Message::new_assistant(answer.content.as_str()));
        }

        self.store.save(&conversation).await?;
        info!(
            "Saved conversation: id={}, messages={}",
            conversation.id(),
            conversation.message_count()
        );

        Ok(Answer::success(conversation.id().clone(), answer.content))
    }
}

#[async_trait]
impl CommandHandler<RequestSystemHelpCommand> for ConversationService {
    async fn handle(&self, command: RequestSystemHelpCommand) -> Result<Answer, ApplicationError> {
        info!("Handling system help command");
        self.respond(
            &command.message,
            &command.system_context,
            command.conversation_id,
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::assistant::domain::Sender;
    use crate::modules::assistant::infrastructure::{
        FakeReasoningBackend, InMemoryConversationStore,
    };
    use crate::modules::assistant::ports::{
        GenerationSettings, ReasoningError, RepositoryError, Tool,
    };
    use crate::modules::assistant::Conversation;

    /// 总是失败的推理后端
    struct FailingBackend;

    #[async_trait]
    impl ReasoningBackend for FailingBackend {
        fn backend_id(&self) -> &str {
            "failing"
        }

        async fn chat(
            &self,
            _conversation_id: &ConversationId,
            _messages: &[Message],
        ) -> Result<Answer, ReasoningError> {
            Err(ReasoningError::NetworkError("connection refused".to_string()))
        }

        async fn settings(&self) -> GenerationSettings {
            GenerationSettings::default()
        }

        async fn update_settings(
            &self,
            _temperature: Option<f32>,
            _tools: Option<Vec<Arc<dyn Tool>>>,
        ) {
        }
    }

    /// 读取正常、写入失败的存储
    struct ReadOnlyStore;

    #[async_trait]
    impl ConversationStore for ReadOnlyStore {
        async fn get_by_id(
            &self,
            _id: &ConversationId,
        ) -> Result<Option<Conversation>, RepositoryError> {
            Ok(None)
        }

        async fn save(&self, _conversation: &Conversation) -> Result<ConversationId, RepositoryError> {
            Err(RepositoryError::DatabaseError("disk full".to_string()))
        }
    }

    fn linux_context() -> SystemContext {
        SystemContext::new(
            "Linux",
            "Ubuntu",
            "/home/u",
            vec!["a".to_string(), "b".to_string()],
        )
    }

    #[tokio::test]
    async fn test_new_conversation_end_to_end() {
        let store = Arc::new(InMemoryConversationStore::new());
        let backend = Arc::new(FakeReasoningBackend::with_content("You are on Linux."));
        let service = ConversationService::new(store.clone(), backend);

        let answer = service
            .respond("what OS am I on?", &linux_context(), None)
            .await
            .unwrap();

        assert!(answer.succeeded);
        assert_eq!(answer.content, "You are on Linux.");

        let saved = store
            .get_by_id(&answer.conversation_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(saved.title(), "what OS am I on?");

        let messages = saved.messages();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0].sender(), Sender::Assistant);
        assert!(messages[0].content().contains("OS: Linux"));
        assert!(messages[0].content().contains("Directory list: ['a', 'b']"));
        assert_eq!(messages[1], Message::new_user("what OS am I on?"));
        assert_eq!(messages[2], Message::new_assistant("You are on Linux."));
        assert_eq!(store.count().await, 1);
    }

    #[tokio::test]
    async fn test_follow_up_reuses_conversation() {
        let store = Arc::new(InMemoryConversationStore::new());
        let backend = Arc::new(FakeReasoningBackend::new());
        let service = ConversationService::new(store.clone(), backend);
        let id = ConversationId::from("chat-1");

        let first = service
            .respond("hello", &linux_context(), Some(id.clone()))
            .await
            .unwrap();
        assert_eq!(first.conversation_id, id);
        let after_first = store.get_by_id(&id).await.unwrap().unwrap();
        assert_eq!(after_first.message_count(), 3);

        service
            .respond("how are you", &linux_context(), Some(id.clone()))
            .await
            .unwrap();
        let after_second = store.get_by_id(&id).await.unwrap().unwrap();
        assert_eq!(after_second.message_count(), 5);
        assert_eq!(after_second.title(), "hello");
        assert_eq!(after_second.messages()[3], Message::new_user("how are you"));
        assert_eq!(store.count().await, 1);
    }

    #[tokio::test]
    async fn test_unknown_id_creates_conversation_with_that_id() {
        let store = Arc::new(InMemoryConversationStore::new());
        let service = ConversationService::new(store.clone(), Arc::new(FakeReasoningBackend::new()));
        let id = ConversationId::from("never-seen");

        let answer = service
            .respond("hi", &linux_context(), Some(id.clone()))
            .await
            .unwrap();

        assert_eq!(answer.conversation_id, id);
        assert!(store.get_by_id(&id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_backend_failure_persists_nothing() {
        let store = Arc::new(InMemoryConversationStore::new());
        let service = ConversationService::new(store.clone(), Arc::new(FailingBackend));

        let result = service.respond("hello", &linux_context(), None).await;

        assert!(matches!(result, Err(ApplicationError::ReasoningFailure(_))));
        assert_eq!(store.count().await, 0);
    }

    #[tokio::test]
    async fn test_backend_failure_keeps_existing_history() {
        let store = Arc::new(InMemoryConversationStore::new());
        let id = ConversationId::from("chat-2");
        ConversationService::new(store.clone(), Arc::new(FakeReasoningBackend::new()))
            .respond("hello", &linux_context(), Some(id.clone()))
            .await
            .unwrap();

        let failing = ConversationService::new(store.clone(), Arc::new(FailingBackend));
        let result = failing
            .respond("again", &linux_context(), Some(id.clone()))
            .await;

        assert!(result.is_err());
        let saved = store.get_by_id(&id).await.unwrap().unwrap();
        assert_eq!(saved.message_count(), 3);
    }

    #[tokio::test]
    async fn test_store_failure_is_surfaced() {
        let service =
            ConversationService::new(Arc::new(ReadOnlyStore), Arc::new(FakeReasoningBackend::new()));

        let result = service.respond("hello", &linux_context(), None).await;

        assert!(matches!(
            result,
            Err(ApplicationError::PersistenceFailure(_))
        ));
    }

    #[tokio::test]
    async fn test_empty_terminal_content_is_success() {
        let store = Arc::new(InMemoryConversationStore::new());
        let backend = Arc::new(FakeReasoningBackend::scripted(vec![]));
        let service = ConversationService::new(store.clone(), backend);

        let answer = service.respond("hello", &linux_context(), None).await.unwrap();

        assert!(answer.succeeded);
        assert_eq!(answer.content, "");
        let saved = store
            .get_by_id(&answer.conversation_id)
            .await
            .unwrap()
            .unwrap();
        assert!(saved.messages().iter().all(|m| !m.content().is_empty()));
    }

    #[tokio::test]
    async fn test_reject_empty_message() {
        let store = Arc::new(InMemoryConversationStore::new());
        let service = ConversationService::new(store.clone(), Arc::new(FakeReasoningBackend::new()));

        let result = service.respond("", &linux_context(), None).await;

        assert!(matches!(result, Err(ApplicationError::ValidationError(_))));
        assert_eq!(store.count().await, 0);
    }

    #[tokio::test]
    async fn test_whitespace_message_is_accepted() {
        let store = Arc::new(InMemoryConversationStore::new());
        let service = ConversationService::new(store.clone(), Arc::new(FakeReasoningBackend::new()));

        let answer = service.respond("   ", &linux_context(), None).await.unwrap();

        let saved = store
            .get_by_id(&answer.conversation_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(saved.title(), "   ");
        assert_eq!(saved.messages()[1], Message::new_user("   "));
        assert_eq!(saved.message_count(), 3);
    }

    #[tokio::test]
    async fn test_handle_command() {
        let store = Arc::new(InMemoryConversationStore::new());
        let service = ConversationService::new(store, Arc::new(FakeReasoningBackend::new()));

        let command = RequestSystemHelpCommand::new("hello", linux_context(), None);
        let answer = service.handle(command).await.unwrap();

        assert_eq!(answer.content, "I'm LLM");
    }
}
