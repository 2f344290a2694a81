// Assistant Module - 系统助手模块
//
// 实现六边形架构（Hexagonal Architecture）：
// - domain: 领域层，包含对话实体、值对象和领域服务
// - ports: 端口层，定义存储、推理后端和工具的抽象接口
// - infrastructure: 基础设施层，实现端口的具体适配器
// - application: 应用层，实现 CQRS 命令和查询处理器

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod ports;

// 重新导出常用类型
pub use application::{
    ApplicationError, Command, CommandHandler, ConversationService, GetConversationHandler,
    GetConversationQuery, Query, QueryHandler, RequestSystemHelpCommand,
};

pub use domain::{Answer, Conversation, ConversationId, Message, Sender, SystemContext};

pub use infrastructure::{
    create_conversation_store, create_reasoning_backend, os_tools, DgraphConversationStore,
    FakeReasoningBackend, InMemoryConversationStore, OpenAICompatibleBackend, ResponseReducer,
    SqliteConversationStore,
};

pub use ports::{
    ConversationStore, EventRole, GenerationSettings, ReasoningBackend, ReasoningError,
    ReasoningEvent, RepositoryError, Tool, ToolError,
};

use std::any::type_name;
use std::sync::Arc;
use tracing::info;

use crate::infrastructure::config::{LlmSettings, Settings, StorageKind};
use crate::infrastructure::DispatchBus;
use crate::shared::AppResult;

/// Assistant 模块容器
///
/// 启动时一次性组装存储、推理后端、对话服务和分发总线
pub struct AssistantModule {
    store: Arc<dyn ConversationStore>,
    backend: Arc<dyn ReasoningBackend>,
    bus: DispatchBus,
}

impl AssistantModule {
    /// 按配置创建模块
    ///
    /// # Errors
    /// 存储无法连接或推理后端缺少凭据时返回错误
    pub async fn build(
        settings: &Settings,
        llm: &LlmSettings,
        storage: StorageKind,
    ) -> AppResult<Self> {
        let store = create_conversation_store(settings, storage).await?;
        let backend = create_reasoning_backend(settings, llm).await?;

        info!(
            "Assistant module ready: backend={}, storage={}",
            backend.backend_id(),
            storage
        );
        Ok(Self::with_components(store, backend))
    }

    /// 使用自定义存储和推理后端创建模块
    pub fn with_components(
        store: Arc<dyn ConversationStore>,
        backend: Arc<dyn ReasoningBackend>,
    ) -> Self {
        let service = Arc::new(ConversationService::new(store.clone(), backend.clone()));

        let mut bus = DispatchBus::new();
        bus.register_command_handler::<RequestSystemHelpCommand>(service);
        bus.register_query_handler::<GetConversationQuery>(Arc::new(
            GetConversationHandler::new(store.clone()),
        ));

        Self {
            store,
            backend,
            bus,
        }
    }

    pub fn bus(&self) -> &DispatchBus {
        &self.bus
    }

    /// 启动阶段追加处理器
    pub fn bus_mut(&mut self) -> &mut DispatchBus {
        &mut self.bus
    }

    pub fn store(&self) -> Arc<dyn ConversationStore> {
        self.store.clone()
    }

    pub fn backend(&self) -> Arc<dyn ReasoningBackend> {
        self.backend.clone()
    }

    /// 分发帮助命令并返回第一个处理器的回答
    pub async fn ask(
        &self,
        message: impl Into<String>,
        system_context: SystemContext,
        conversation_id: Option<ConversationId>,
    ) -> Result<Answer, ApplicationError> {
        let command = RequestSystemHelpCommand::new(message, system_context, conversation_id);
        let missing = ApplicationError::NoHandlerRegistered(type_name::<RequestSystemHelpCommand>());

        self.bus
            .dispatch_command(command)
            .await?
            .into_iter()
            .next()
            .ok_or(missing)
    }

    /// 读取对话
    pub async fn get_conversation(
        &self,
        conversation_id: ConversationId,
    ) -> Result<Option<Conversation>, ApplicationError> {
        self.bus
            .dispatch_query(GetConversationQuery::new(conversation_id))
            .await
    }
}
