// Assistant Domain - Services
// 领域服务处理不属于任何实体的业务逻辑

mod conversation_factory;
mod system_prompt;

pub use conversation_factory::*;
pub use system_prompt::*;
