// Assistant Repositories - 对话存储实现

mod dgraph_conversation_store;
mod factory;
mod in_memory_conversation_store;
mod sqlite_conversation_store;

pub use dgraph_conversation_store::DgraphConversationStore;
pub use factory::create_conversation_store;
pub use in_memory_conversation_store::InMemoryConversationStore;
pub use sqlite_conversation_store::SqliteConversationStore;
