// Assistant Domain Layer
// 领域层包含聚合根、值对象和领域服务

pub mod entities;
pub mod services;
pub mod value_objects;

// 重导出常用类型
pub use entities::{Conversation, Message};
pub use services::{build_system_prompt, derive_title, ConversationFactory};
pub use value_objects::{Answer, ConversationId, InvalidSender, Sender, SystemContext};
