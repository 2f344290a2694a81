// Assistant Infrastructure Layer
// 基础设施层包含端口的具体实现

pub mod adapters;
pub mod repositories;
pub mod tools;

// 重导出常用类型
pub use adapters::reasoning::{
    create_reasoning_backend, FakeReasoningBackend, OpenAICompatibleBackend, ResponseReducer,
};
pub use repositories::{
    create_conversation_store, DgraphConversationStore, InMemoryConversationStore,
    SqliteConversationStore,
};
pub use tools::os_tools;
